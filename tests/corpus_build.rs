use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use glyphmatch::io::{load_corpus_dir, save_example};
use glyphmatch::{CorpusReport, LabeledExample, PipelineConfig, TemplateStore};
use std::io::Cursor;

const GLYPH_A: [&str; 5] = [".#.", "#.#", "###", "#.#", "#.#"];
const GLYPH_B: [&str; 5] = ["##.", "#.#", "##.", "#.#", "##."];
const GLYPH_C: [&str; 5] = [".##", "#..", "#..", "#..", ".##"];

fn glyph(ch: char) -> &'static [&'static str; 5] {
    match ch {
        'A' => &GLYPH_A,
        'B' => &GLYPH_B,
        'C' => &GLYPH_C,
        other => panic!("no test glyph for {other}"),
    }
}

/// Renders `word` as a grey PNG payload with `gap` blank columns between glyphs.
fn word_payload(word: &str, gap: usize) -> Vec<u8> {
    let mut columns: Vec<[bool; 5]> = vec![[false; 5]];
    for (idx, ch) in word.chars().enumerate() {
        if idx > 0 {
            columns.extend(std::iter::repeat([false; 5]).take(gap));
        }
        let rows = glyph(ch);
        for x in 0..rows[0].len() {
            let mut col = [false; 5];
            for (y, row) in rows.iter().enumerate() {
                col[y] = row.as_bytes()[x] == b'#';
            }
            columns.push(col);
        }
    }
    columns.push([false; 5]);

    let img = image::GrayImage::from_fn(columns.len() as u32, 5, |x, y| {
        if columns[x as usize][y as usize] {
            image::Luma([10])
        } else {
            image::Luma([250])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    STANDARD.encode(buf.into_inner()).into_bytes()
}

#[test]
fn example_kept_only_when_glyph_count_matches_label() {
    let corpus = vec![
        // Four glyphs, five-character label.
        LabeledExample::new("ABCAB", word_payload("ABCA", 2)),
        LabeledExample::new("ABC", word_payload("ABC", 2)),
    ];
    let (store, report) = TemplateStore::build_with_report(corpus, PipelineConfig::default());
    assert_eq!(
        report,
        CorpusReport {
            accepted: 1,
            dropped_mismatch: 1,
            dropped_decode: 0,
            templates_added: 3,
        }
    );
    let labels: String = store.all().map(|t| t.label()).collect();
    assert_eq!(labels, "ABC");
}

#[test]
fn touching_glyphs_drop_the_example() {
    let corpus = vec![LabeledExample::new("AB", word_payload("AB", 0))];
    let (store, report) = TemplateStore::build_with_report(corpus, PipelineConfig::default());
    assert!(store.is_empty());
    assert_eq!(report.dropped_mismatch, 1);
}

#[test]
fn corrupted_example_does_not_abort_build() {
    let corpus = vec![
        LabeledExample::new("AB", word_payload("AB", 2)),
        LabeledExample::new("CC", b"this is !! not base64".to_vec()),
        LabeledExample::new("CA", word_payload("CA", 1)),
    ];
    let (store, report) = TemplateStore::build_with_report(corpus, PipelineConfig::default());
    assert_eq!(report.accepted, 2);
    assert_eq!(report.dropped_decode, 1);
    assert_eq!(report.examples(), 3);
    let labels: String = store.all().map(|t| t.label()).collect();
    assert_eq!(labels, "ABCA");
}

#[test]
fn duplicate_templates_are_kept() {
    let corpus = vec![
        LabeledExample::new("AB", word_payload("AB", 2)),
        LabeledExample::new("AB", word_payload("AB", 3)),
    ];
    let store = TemplateStore::build(corpus, PipelineConfig::default());
    assert_eq!(store.len(), 4);
    assert_eq!(store.as_slice()[0].region(), store.as_slice()[2].region());
}

#[test]
fn corpus_directory_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    for word in ["ABC", "CAB", "ABC"] {
        save_example(dir.path(), &LabeledExample::new(word, word_payload(word, 2))).unwrap();
    }
    std::fs::write(dir.path().join("BAD"), b"corrupted").unwrap();

    let corpus = load_corpus_dir(dir.path()).unwrap();
    let labels: Vec<&str> = corpus.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["ABC", "ABC", "BAD", "CAB"]);

    let (store, report) = TemplateStore::build_with_report(corpus, PipelineConfig::default());
    assert_eq!(report.accepted, 3);
    assert_eq!(report.dropped_decode, 1);
    assert_eq!(store.len(), 9);
}
