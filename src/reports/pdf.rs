use anyhow::anyhow;
use printpdf::{BuiltinFont, Mm, PdfDocument};

/// What goes on the page.
#[derive(Debug, Clone)]
pub struct ReportContent<'a> {
    pub pet_name: &'a str,
    pub species: &'a str,
    pub breed: Option<&'a str>,
    pub age: i32,
    pub summary: &'a str,
}

const WRAP_AT: usize = 90;
const LINE_MM: f32 = 6.0;
const TOP_MM: f32 = 270.0;
const BOTTOM_MM: f32 = 20.0;

/// Greedy word wrap on character count.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// Builtin fonts only cover Latin-1; anything else becomes `?`.
fn latin(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() || ('\u{A0}'..='\u{FF}').contains(&c) { c } else { '?' })
        .collect()
}

/// Renders a single-page A4 report and returns the PDF bytes.
pub fn render(content: &ReportContent<'_>) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new("Pet report", Mm(210.0), Mm(297.0), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("load Helvetica: {:?}", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("load Helvetica-Bold: {:?}", e))?;
    let layer = doc.get_page(page).get_layer(layer);

    layer.use_text("Pet report", 20.0, Mm(20.0), Mm(TOP_MM), &bold);

    let facts = [
        format!("Name: {}", content.pet_name),
        format!("Species: {}", content.species),
        format!("Breed: {}", content.breed.unwrap_or("-")),
        format!("Age: {}", content.age),
    ];
    let mut y = TOP_MM - 14.0;
    for fact in &facts {
        layer.use_text(latin(fact), 12.0, Mm(20.0), Mm(y), &regular);
        y -= LINE_MM;
    }

    y -= LINE_MM;
    layer.use_text("Summary", 14.0, Mm(20.0), Mm(y), &bold);
    y -= LINE_MM + 2.0;
    for line in wrap(&latin(content.summary), WRAP_AT) {
        if y < BOTTOM_MM {
            break;
        }
        layer.use_text(line, 11.0, Mm(20.0), Mm(y), &regular);
        y -= LINE_MM;
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("serialize pdf: {:?}", e))
}
