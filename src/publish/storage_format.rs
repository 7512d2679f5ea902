//! Confluence storage format preparation

use regex::{NoExpand, Regex};
use std::sync::LazyLock;

use crate::constants::confluence::IMAGE_WIDTH;

static HEADING_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(<h[1-3][\s>])").expect("valid heading regex"));
static HEADING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(</h[1-3]>)\s*").expect("valid heading regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid blank-run regex"));
static SCREENSHOT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<h2>Dashboard Screenshots</h2>\s*<ul>.*?</ul>")
        .expect("valid screenshot list regex")
});
static WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\A<div style="[^"]*max-width[^"]*">(.*)</div>\s*\z"#)
        .expect("valid wrapper regex")
});

/// Convert a guide page into a storage-format body
///
/// Plain text is escaped and split into paragraphs. HTML loses the
/// centered layout `<div>` of a rendered guide and gets blank lines around
/// h1-h3 so Confluence builds heading anchors.
pub fn to_storage_format(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.contains('<') {
        return plain_text_paragraphs(trimmed);
    }

    let inner = WRAPPER
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let spaced = HEADING_OPEN.replace_all(inner, "\n\n$1");
    let spaced = HEADING_CLOSE.replace_all(&spaced, "$1\n\n");
    BLANK_RUNS.replace_all(&spaced, "\n\n").trim().to_string()
}

/// Storage-format block embedding an uploaded attachment
pub fn image_embed(file_name: &str) -> String {
    format!(
        "<p><ac:image ac:width=\"{}\"><ri:attachment ri:filename=\"{}\"/></ac:image></p>",
        IMAGE_WIDTH,
        escape(file_name)
    )
}

/// Embed each attachment under a "Dashboard Screenshots" section
///
/// A rendered guide already lists the screenshot names under that heading;
/// the list is replaced in place. Otherwise the section is appended.
pub fn with_screenshots(body: &str, file_names: &[String]) -> String {
    if file_names.is_empty() {
        return body.to_string();
    }
    let mut section = String::from("<h2>Dashboard Screenshots</h2>\n\n");
    for name in file_names {
        section.push_str(&format!("<h3>{}</h3>\n", escape(name)));
        section.push_str(&image_embed(name));
        section.push_str("\n\n");
    }
    let section = section.trim_end();

    if SCREENSHOT_LIST.is_match(body) {
        return SCREENSHOT_LIST
            .replace(body, NoExpand(section))
            .trim_end()
            .to_string();
    }
    format!("{}\n\n{}", body.trim_end(), section)
}

fn plain_text_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape(p).replace('\n', "<br/>")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_spaced_and_wrapper_removed() {
        let page = "<div style=\"text-align: center; max-width: 800px;\">\n<h1>Guide</h1><p>a</p><h2>Objective</h2>\n\n\n\n<p>b</p></div>";
        assert_eq!(
            to_storage_format(page),
            "<h1>Guide</h1>\n\n<p>a</p>\n\n<h2>Objective</h2>\n\n<p>b</p>"
        );
    }

    #[test]
    fn test_inner_divs_kept() {
        let page = "<h2>A</h2><div class=\"note\">x</div><p>y</p>";
        assert!(to_storage_format(page).contains("<div class=\"note\">x</div>"));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            to_storage_format("Revenue & growth\nby region\n\nSecond"),
            "<p>Revenue &amp; growth<br/>by region</p>\n<p>Second</p>"
        );
    }

    #[test]
    fn test_screenshot_section() {
        let body = with_screenshots("<p>x</p>", &["queue.png".to_string()]);
        assert!(body.contains("<h2>Dashboard Screenshots</h2>"));
        assert!(body.contains(
            "<ac:image ac:width=\"800\"><ri:attachment ri:filename=\"queue.png\"/></ac:image>"
        ));
        assert_eq!(with_screenshots("<p>x</p>", &[]), "<p>x</p>");
    }

    #[test]
    fn test_screenshot_list_replaced_not_duplicated() {
        let page = "<div style=\"text-align: center; max-width: 800px;\">\n<h1>Guide</h1>\n\
            <h2>Dashboard Screenshots</h2>\n<ul>\n<li>queue.png</li>\n</ul>\n\n<hr/>\n<p>footer</p>\n</div>";
        let body = with_screenshots(&to_storage_format(page), &["queue.png".to_string()]);

        assert_eq!(body.matches("<h2>Dashboard Screenshots</h2>").count(), 1);
        assert!(!body.contains("<li>queue.png</li>"));
        assert!(body.contains("ri:filename=\"queue.png\""));
        // embeds stay above the footer
        assert!(body.find("ri:attachment").unwrap() < body.find("<hr/>").unwrap());
    }
}
