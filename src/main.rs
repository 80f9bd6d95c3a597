use pdfcodec::{EmbeddingPolicy, FontKind, TrueTypeFont};

fn main() {
    let mut args = std::env::args();
    let infile = args.nth(1).expect("usage: pdfcodec <font[.ttcN]> <text> <out.ttf>");
    let text = args.next().expect("missing text to subset for");
    let outfile = args.next().expect("missing output path");

    println!("Reading from {infile}");
    let mut font = TrueTypeFont::open(&infile, FontKind::CidType2, EmbeddingPolicy::Subset).unwrap();

    font.encode_text(&text);
    println!(
        "Subsetting {} to {} glyphs",
        font.base_font(),
        font.used_glyphs().len()
    );
    let ttf = font.font_program().unwrap();

    println!("Writing to {outfile}");
    std::fs::write(outfile, ttf).unwrap();
}
