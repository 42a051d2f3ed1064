//! Demo document generator
//!
//! Builds a short multi-page report exercising headers, footers, page
//! count aliases, justified text, drawing and an outline.
//!
//! Usage:
//!   cargo run --bin quill_demo
//!   cargo run --bin quill_demo -- --output demo.pdf --pages 5 --uncompressed

use pdf_quill::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

const PARAGRAPH: &str = "Generated documents are built page by page. Text flows between the \
    margins, breaking lines at spaces and pages at the bottom margin, while the header and \
    footer callbacks decorate every page as it is opened and closed. ";

struct DemoConfig {
    output: PathBuf,
    pages: usize,
    compress: bool,
}

impl DemoConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut output = PathBuf::from("quill_demo.pdf");
        let mut pages = 3;
        let mut compress = true;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--output" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output = PathBuf::from(&args[i]);
                    }
                },
                "--pages" => {
                    i += 1;
                    if let Some(n) = args.get(i).and_then(|s| s.parse().ok()) {
                        pages = n;
                    }
                },
                "--uncompressed" => compress = false,
                other => log::warn!("Ignoring unknown argument {}", other),
            }
            i += 1;
        }

        Self {
            output,
            pages: pages.max(1),
            compress,
        }
    }
}

fn build(config: &DemoConfig) -> Document {
    let mut doc = Document::new(DocumentConfig::new().with_compression(config.compress));
    doc.set_title("pdf_quill demo", false);
    doc.set_author("pdf_quill", false);
    doc.alias_nb_pages("");

    doc.set_header_func(|d| {
        d.set_font("Arial", "B", 14.0);
        d.cell_format(0.0, 10.0, "pdf_quill demo", "B", LineBreak::NextLine, "C", false, None);
        d.ln(4.0);
    });
    doc.set_footer_func(|d| {
        d.set_y(-15.0);
        d.set_font("Arial", "I", 8.0);
        let label = format!("Page {}/{{nb}}", d.page_no());
        d.cell_format(0.0, 10.0, &label, "", LineBreak::Right, "C", false, None);
    });

    for chapter in 1..=config.pages {
        doc.add_page();
        let title = format!("Chapter {}", chapter);
        doc.bookmark(&title, 0, -1.0);
        doc.set_font("Times", "B", 12.0);
        doc.set_fill_color(220, 230, 245);
        doc.cell_format(0.0, 8.0, &title, "", LineBreak::NextLine, "L", true, None);
        doc.ln(2.0);

        doc.set_font("Times", "", 11.0);
        doc.multi_cell(0.0, 5.0, &PARAGRAPH.repeat(6), "", "J", false);
        doc.ln(4.0);

        doc.set_draw_color(40, 80, 160);
        doc.set_line_width(0.4);
        let y = doc.y();
        doc.circle(40.0, y + 15.0, 10.0, "D");
        doc.rect(60.0, y + 5.0, 40.0, 20.0, "D");
        doc.line(110.0, y + 5.0, 150.0, y + 25.0);
        doc.set_y(y + 30.0);
    }
    doc
}

fn main() -> ExitCode {
    env_logger::init();
    let config = DemoConfig::from_args();

    let start = Instant::now();
    let mut doc = build(&config);
    match doc.output_file_and_close(&config.output) {
        Ok(()) => {
            println!(
                "Wrote {} ({} pages) in {:.1} ms",
                config.output.display(),
                doc.page_count(),
                start.elapsed().as_secs_f64() * 1000.0
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
