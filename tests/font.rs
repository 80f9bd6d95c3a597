mod common;

use common::{A, A_DIAERESIS, B, FontBuilder, collection, glyphs_with_outlines};
use font_types::Tag;
use pdfcodec::truetype::{FontMetrics, TableDirectory};
use pdfcodec::{EmbeddingPolicy, Error, ErrorKind, FontKind, PdfEncoding, TrueTypeFont};
use pretty_assertions::assert_eq;

fn load(builder: &FontBuilder, kind: FontKind) -> Result<TrueTypeFont, Error> {
    TrueTypeFont::from_bytes(builder.build(), None, kind, EmbeddingPolicy::Subset)
}

#[test]
fn metrics_are_in_glyph_space() {
    let builder = FontBuilder {
        units_per_em: 2000,
        cap_height: 1400,
        ..FontBuilder::new()
    };
    let font = load(&builder, FontKind::TrueType).unwrap();
    assert_eq!(
        font.metrics(),
        &FontMetrics {
            ascent: 400,
            descent: -100,
            cap_height: 700,
            avg_width: 275,
            max_width: 500,
            italic_angle: 0.0,
            bbox: [-25, -100, 500, 450],
            flags: 32,
            stem_v: 80,
            stem_h: 80,
            underline_position: -50,
            underline_thickness: 25,
        }
    );
    assert_eq!(font.units_per_em(), 2000);
    assert_eq!(font.num_glyphs(), 9);
    assert_eq!(font.char_width('A'), 300);
}

#[test]
fn cap_height_falls_back_for_old_os2() {
    let builder = FontBuilder {
        os2_version: 1,
        units_per_em: 2000,
        ..FontBuilder::new()
    };
    let font = load(&builder, FontKind::TrueType).unwrap();
    assert_eq!(font.metrics().cap_height, 700);
}

#[test]
fn short_os2_uses_hhea_metrics() {
    let builder = FontBuilder {
        os2_version: 0,
        ..FontBuilder::new()
    };
    let font = load(&builder, FontKind::TrueType).unwrap();
    let metrics = font.metrics();
    assert_eq!((metrics.ascent, metrics.descent), (850, -250));
    assert_eq!(metrics.cap_height, 700);
    assert_eq!(metrics.avg_width, 550);
}

#[test]
fn style_flags() {
    let italic = FontBuilder {
        mac_style: 2,
        ..FontBuilder::new()
    };
    let font = load(&italic, FontKind::TrueType).unwrap();
    assert_eq!(font.metrics().flags, 32 | 64);
    assert_eq!(font.metrics().italic_angle, -12.0);

    let bold_mono = FontBuilder {
        mac_style: 1,
        fixed_pitch: true,
        ..FontBuilder::new()
    };
    let font = load(&bold_mono, FontKind::TrueType).unwrap();
    assert_eq!(font.metrics().flags, 1 | 32 | 262144);
}

#[test]
fn symbolic_fonts_use_font_specific_codes() {
    let builder = FontBuilder {
        symbol: true,
        ..FontBuilder::new()
    };
    let mut font = load(&builder, FontKind::TrueType).unwrap();
    assert!(font.is_symbolic());
    assert_eq!(font.encoding(), PdfEncoding::FontSpecific);
    assert_eq!(font.metrics().flags, 4);

    assert_eq!(font.encode_text("A\u{F042}"), vec![0x41, 0x42]);
    assert!(font.used_glyphs().contains(&(A as u32)));
    assert!(font.used_glyphs().contains(&(B as u32)));
}

#[test]
fn missing_tables_are_named() {
    for tag in [b"head", b"hhea", b"OS/2", b"loca", b"hmtx", b"maxp"] {
        let builder = FontBuilder::new().without(tag);
        match load(&builder, FontKind::CidType2) {
            Err(Error::TableNotPresent(missing)) => assert_eq!(missing, Tag::new(tag)),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("loaded a font without {}", Tag::new(tag)),
        }
    }
}

#[test]
fn cmap_is_only_required_for_simple_fonts() {
    let builder = FontBuilder::new().without(b"cmap");
    assert!(matches!(
        load(&builder, FontKind::TrueType),
        Err(Error::TableNotPresent(tag)) if tag == Tag::new(b"cmap")
    ));

    let mut font = load(&builder, FontKind::CidType2).unwrap();
    assert!(font.encode_text("A").is_empty());
}

#[test]
fn subsetting_needs_glyf() {
    let builder = FontBuilder::new().without(b"glyf");
    let font = load(&builder, FontKind::TrueType).unwrap();
    let err = font.font_program().unwrap_err();
    assert!(matches!(err, Error::TableNotPresent(tag) if tag == Tag::new(b"glyf")));
    assert_eq!(err.kind(), ErrorKind::BadFileFormat);
}

#[test]
fn bad_font_data() {
    let mut otto = FontBuilder::new().build();
    otto[..4].copy_from_slice(b"OTTO");
    assert!(matches!(
        TrueTypeFont::from_bytes(otto, None, FontKind::TrueType, EmbeddingPolicy::Full),
        Err(Error::BadFontFormat(_))
    ));

    let err = TrueTypeFont::from_bytes(vec![0, 1], None, FontKind::TrueType, EmbeddingPolicy::Full)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::BadFileFormat);

    let mut truncated = FontBuilder::new().build();
    truncated.truncate(truncated.len() - 40);
    let err = TrueTypeFont::from_bytes(truncated, None, FontKind::TrueType, EmbeddingPolicy::Full)
        .err()
        .unwrap();
    assert!(matches!(err, Error::MalformedTable { .. }));
}

#[test]
fn simple_widths_cover_used_codes() {
    let mut font = load(&FontBuilder::new(), FontKind::TrueType).unwrap();
    assert_eq!(font.simple_widths(), (0, 0, vec![]));

    font.encode_text("CA");
    assert_eq!(font.simple_widths(), (0x41, 0x43, vec![600, 0, 700]));
}

#[test]
fn mac_roman_encoding() {
    let mut font = load(&FontBuilder::new(), FontKind::TrueType)
        .unwrap()
        .with_encoding(PdfEncoding::MacRoman);
    assert_eq!(font.encoding(), PdfEncoding::MacRoman);
    assert_eq!(font.encode_text("Ä"), vec![0x80]);
    assert!(font.used_glyphs().contains(&(A_DIAERESIS as u32)));
    assert_eq!(font.simple_widths(), (0x80, 0x80, vec![600]));

    // Two-byte encodings are not available for simple fonts.
    let font = font.with_encoding(PdfEncoding::IdentityH);
    assert_eq!(font.encoding(), PdfEncoding::MacRoman);
}

#[test]
fn cid_widths_skip_default_width() {
    let mut font = load(&FontBuilder::new(), FontKind::CidType2).unwrap();
    assert_eq!(font.encode_text("AB\u{4E2D}"), vec![0, 2, 0, 3, 0, 8]);

    let rendered: Vec<String> = font.cid_widths().iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["0 [500]", "2 [600 650]"]);
}

#[test]
fn width_past_hmtx_uses_glyph_zero() {
    let mut builder = FontBuilder::new();
    builder.cmap.push((0x5A, 40));
    let font = load(&builder, FontKind::TrueType).unwrap();

    assert_eq!(font.glyph_width(40), 500);
    let entry = font.glyph_for_char('Z').unwrap();
    assert_eq!((entry.glyph, entry.width), (40, 500));
}

#[test]
fn names_and_subset_tags() {
    let mut font = load(&FontBuilder::new(), FontKind::TrueType).unwrap();
    let mut other = load(&FontBuilder::new(), FontKind::TrueType).unwrap();
    assert_eq!(font.postscript_name(), Some("Synthetic-Regular"));

    font.encode_text("AB");
    other.encode_text("BA");
    assert_eq!(font.subset_tag(), other.subset_tag());

    let base_font = font.base_font();
    let (tag, name) = base_font.split_once('+').unwrap();
    assert_eq!(name, "Synthetic-Regular");
    assert_eq!(tag.len(), 6);
    assert!(tag.bytes().all(|b| b.is_ascii_uppercase()));

    let unnamed = FontBuilder {
        name: None,
        ..FontBuilder::new()
    };
    let font = TrueTypeFont::from_bytes(unnamed.build(), None, FontKind::TrueType, EmbeddingPolicy::Full)
        .unwrap();
    assert_eq!(font.postscript_name(), None);
    assert_eq!(font.base_font(), "Untitled");
}

fn two_font_collection() -> tempfile::NamedTempFile {
    let first = FontBuilder::new();
    let mut second = FontBuilder {
        name: Some("Second-Bold".to_string()),
        mac_style: 1,
        ..FontBuilder::new()
    };
    second.glyphs[A as usize].1 = 720;

    let file = tempfile::Builder::new().suffix(".ttc").tempfile().unwrap();
    std::fs::write(file.path(), collection(&[first, second])).unwrap();
    file
}

#[test]
fn collection_members_are_selected_by_path() {
    let file = two_font_collection();
    let path = file.path().to_str().unwrap();

    let first = TrueTypeFont::open(path, FontKind::TrueType, EmbeddingPolicy::Full).unwrap();
    assert_eq!(first.postscript_name(), Some("Synthetic-Regular"));

    for suffix in [",1", "1"] {
        let font = TrueTypeFont::open(
            &format!("{path}{suffix}"),
            FontKind::TrueType,
            EmbeddingPolicy::Full,
        )
        .unwrap();
        assert_eq!(font.postscript_name(), Some("Second-Bold"));
        assert_eq!(font.char_width('A'), 720);
    }

    match TrueTypeFont::open(&format!("{path},2"), FontKind::TrueType, EmbeddingPolicy::Full) {
        Err(Error::InvalidTtcIndex { index, count }) => assert_eq!((index, count), (2, 2)),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("index 2 of a two-font collection loaded"),
    }
}

#[test]
fn collection_member_subset() {
    let file = two_font_collection();
    let path = format!("{},1", file.path().to_str().unwrap());
    let mut font = TrueTypeFont::open(&path, FontKind::CidType2, EmbeddingPolicy::Subset).unwrap();
    font.encode_text("B");

    let program = font.font_program().unwrap();
    TableDirectory::parse(&program)
        .unwrap()
        .verify_checksums(&program)
        .unwrap();
    assert_eq!(glyphs_with_outlines(&program), vec![0, B as u32]);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = TrueTypeFont::open(
        "/nonexistent/font.ttf",
        FontKind::TrueType,
        EmbeddingPolicy::Full,
    )
    .err()
    .unwrap();
    assert_eq!(err.kind(), ErrorKind::Io);
}
