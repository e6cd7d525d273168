use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use glyphmatch::segment::segment;
use glyphmatch::{
    decode_payload, solve, BinaryGrid, Classification, LabeledExample, PipelineConfig,
    SolveConfig, Solver, TemplateStore,
};
use std::io::Cursor;

const GLYPH_A: [&str; 5] = [".#.", "#.#", "###", "#.#", "#.#"];
const GLYPH_B: [&str; 5] = ["##.", "#.#", "##.", "#.#", "##."];
const GLYPH_C: [&str; 5] = [".##", "#..", "#..", "#..", ".##"];
const GLYPH_X: [&str; 5] = ["#..#", ".##.", ".##.", ".##.", "#..#"];

const MARGIN: usize = 1;
const GAP: usize = 2;

fn glyph(ch: char) -> &'static [&'static str; 5] {
    match ch {
        'A' => &GLYPH_A,
        'B' => &GLYPH_B,
        'C' => &GLYPH_C,
        'X' => &GLYPH_X,
        other => panic!("no test glyph for {other}"),
    }
}

/// Lays out `word` with blank gaps and margins; `true` is ink.
fn canvas(word: &str) -> Vec<Vec<bool>> {
    let height = 5 + 2 * MARGIN;
    let mut columns: Vec<Vec<bool>> = vec![vec![false; height]; MARGIN];
    for (idx, ch) in word.chars().enumerate() {
        if idx > 0 {
            columns.extend(std::iter::repeat(vec![false; height]).take(GAP));
        }
        let rows = glyph(ch);
        for x in 0..rows[0].len() {
            let mut col = vec![false; height];
            for (y, row) in rows.iter().enumerate() {
                col[MARGIN + y] = row.as_bytes()[x] == b'#';
            }
            columns.push(col);
        }
    }
    columns.extend(std::iter::repeat(vec![false; height]).take(MARGIN));
    columns
}

fn word_grid(word: &str) -> BinaryGrid {
    let cols = canvas(word);
    BinaryGrid::from_fn(cols.len(), cols[0].len(), |x, y| cols[x][y]).unwrap()
}

fn word_payload(word: &str) -> Vec<u8> {
    let cols = canvas(word);
    let img = image::RgbImage::from_fn(cols.len() as u32, cols[0].len() as u32, |x, y| {
        if cols[x as usize][y as usize] {
            image::Rgb([30, 20, 60])
        } else {
            image::Rgb([235, 240, 250])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    STANDARD.encode(buf.into_inner()).into_bytes()
}

fn seeded_store(word: &str) -> TemplateStore {
    let mut store = TemplateStore::new(PipelineConfig::default());
    let regions = segment(&word_grid(word), PipelineConfig::default().noise_tolerance);
    assert_eq!(store.add_regions(regions, word), Some(word.len()));
    store
}

#[test]
fn synthetic_grid_solves_to_abc() {
    let store = seeded_store("ABC");
    let answer = Solver::new(&store).solve_grid(&word_grid("ABC"));
    assert_eq!(answer.text, "ABC");
    assert!(answer.glyphs.iter().all(|g| g.similarity() == Some(1.0)));
}

#[test]
fn unknown_glyph_length_is_skipped() {
    let store = seeded_store("AC");
    let answer = Solver::new(&store).solve_grid(&word_grid("AXC"));
    assert_eq!(answer.text, "AC");
    assert_eq!(answer.glyphs.len(), 3);
    assert_eq!(answer.glyphs[1], Classification::Unrecognized);
    assert_eq!(answer.unrecognized(), 1);
}

#[test]
fn encoded_payload_solves_against_built_corpus() {
    let corpus = vec![
        LabeledExample::new("ABC", word_payload("ABC")),
        LabeledExample::new("X", word_payload("X")),
    ];
    let store = TemplateStore::build(corpus, PipelineConfig::default());
    assert_eq!(store.len(), 4);

    let cfg = SolveConfig::default();
    assert_eq!(solve(&word_payload("CAB"), &store, &cfg).unwrap(), "CAB");
    assert_eq!(solve(&word_payload("BXAC"), &store, &cfg).unwrap(), "BXAC");
}

#[test]
fn decoded_payload_keeps_source_dimensions() {
    let cols = canvas("AB");
    let raster = decode_payload(&word_payload("AB")).unwrap();
    assert_eq!(raster.width(), cols.len());
    assert_eq!(raster.height(), cols[0].len());
    assert_eq!(raster.channels(), 3);
}

#[test]
fn blank_image_yields_empty_answer() {
    let store = seeded_store("ABC");
    let blank = BinaryGrid::from_fn(12, 7, |_, _| false).unwrap();
    let answer = Solver::new(&store).solve_grid(&blank);
    assert!(answer.text.is_empty());
    assert!(answer.glyphs.is_empty());
}

#[test]
fn isolated_specks_do_not_split_or_add_glyphs() {
    let store = seeded_store("ABC");
    let mut cols = canvas("ABC");
    // One stray pixel in the first gap column stays below the noise tolerance.
    cols[MARGIN + 3][0] = true;
    let grid = BinaryGrid::from_fn(cols.len(), cols[0].len(), |x, y| cols[x][y]).unwrap();
    assert_eq!(Solver::new(&store).solve_grid(&grid).text, "ABC");
}

#[test]
fn similarity_floor_drops_imperfect_glyphs() {
    let store = seeded_store("ABC");
    let mut cols = canvas("ABC");
    // Flip one margin pixel inside the B glyph's first column.
    cols[MARGIN + 3 + GAP][0] = true;
    let grid = BinaryGrid::from_fn(cols.len(), cols[0].len(), |x, y| cols[x][y]).unwrap();

    let lenient = Solver::new(&store).solve_grid(&grid);
    assert_eq!(lenient.text, "ABC");

    let strict = Solver::new(&store).with_config(SolveConfig {
        min_similarity: 1.0,
        ..SolveConfig::default()
    });
    assert_eq!(strict.solve_grid(&grid).text, "AC");
}
