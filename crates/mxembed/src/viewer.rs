//! Viewer config and HTML fragment generation.
//!
//! The output is the three-line snippet the diagrams.net "embed HTML" export
//! produces: a marker comment, a `div.mxgraph` carrying the JSON viewer
//! config in its `data-mxgraph` attribute, and an optional `script` tag that
//! loads the viewer. The `xml` entry of the config always holds the complete
//! original input text; the decoded page list never feeds the output.

use serde::Serialize;

use crate::error::Result;

/// Default toolbar item list, as a comma-separated flag value.
pub const DEFAULT_TOOLBAR: &str = "pages,zoom,layers,tags";

/// Default URL of the hosted viewer script.
pub const DEFAULT_VIEWER_JS: &str = "https://viewer.diagrams.net/js/viewer-static.min.js";

/// Presentation options for one conversion.
///
/// [`EmbedOptions::default`] is the single source of defaults for every
/// surface (CLI and both HTTP routes).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOptions {
    /// Toolbar tokens in display order. Split on commas without trimming, so
    /// stray whitespace in a flag value survives into the config.
    pub toolbar: Vec<String>,
    /// URL for the trailing `script` tag; empty omits the tag entirely.
    pub script_url: String,
    pub dark_mode: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            toolbar: split_toolbar(DEFAULT_TOOLBAR),
            script_url: DEFAULT_VIEWER_JS.to_string(),
            dark_mode: false,
        }
    }
}

impl EmbedOptions {
    pub fn with_toolbar_list(mut self, list: &str) -> Self {
        self.toolbar = split_toolbar(list);
        self
    }

    pub fn with_script_url(mut self, url: &str) -> Self {
        self.script_url = url.to_string();
        self
    }

    pub fn with_dark_mode(mut self, dark_mode: bool) -> Self {
        self.dark_mode = dark_mode;
        self
    }
}

fn split_toolbar(list: &str) -> Vec<String> {
    list.split(',').map(str::to_string).collect()
}

/// The JSON object embedded in the `data-mxgraph` attribute.
///
/// Field order is the serialization order; golden-output tests rely on it
/// staying fixed. `dark-mode` is present only when dark mode is on — the
/// viewer treats the key's presence as the signal, so it is never written as
/// `false`.
#[derive(Debug, Serialize)]
pub struct ViewerConfig<'a> {
    #[serde(rename = "dark-mode", skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    pub edit: &'static str,
    pub highlight: &'static str,
    pub lightbox: bool,
    pub nav: bool,
    pub resize: bool,
    pub toolbar: String,
    pub xml: &'a str,
}

impl<'a> ViewerConfig<'a> {
    pub fn new(xml: &'a str, options: &EmbedOptions) -> Self {
        Self {
            dark_mode: options.dark_mode.then_some(true),
            edit: "_blank",
            highlight: "#0000ff",
            lightbox: false,
            nav: true,
            resize: true,
            toolbar: options.toolbar.join(" "),
            xml,
        }
    }
}

/// Renders the embeddable HTML fragment for `xml`.
///
/// `xml` is embedded verbatim; callers that want well-formedness checking run
/// [`crate::DiagramFile::parse`] first.
pub fn render_embed_html(xml: &str, options: &EmbedOptions) -> Result<String> {
    let config = serde_json::to_string(&ViewerConfig::new(xml, options))?;
    // The attribute is single-quoted, so both quote styles must be escaped.
    let escaped = htmlize::escape_all_quotes(&config);

    let mut html = String::with_capacity(escaped.len() + 256);
    html.push_str("<!-- draw.io diagram -->\n");
    html.push_str(&format!(
        "<div class=\"mxgraph\" style=\"max-width:100%;border:1px solid transparent;\" data-mxgraph='{escaped}'></div>\n"
    ));
    if !options.script_url.is_empty() {
        html.push_str(&format!(
            "<script type=\"text/javascript\" src=\"{}\"></script>\n",
            options.script_url
        ));
    }

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const ONE_PAGE: &str = r#"<mxfile><diagram id="1" name="Page-1"></diagram></mxfile>"#;

    /// Extracts, unescapes and parses the `data-mxgraph` attribute value.
    fn embedded_config(html: &str) -> Value {
        let start = html.find("data-mxgraph='").expect("attribute present") + "data-mxgraph='".len();
        let end = html[start..].find('\'').expect("attribute terminated") + start;
        let json = htmlize::unescape(&html[start..end]);
        serde_json::from_str(&json).expect("valid JSON config")
    }

    #[test]
    fn config_serializes_with_fixed_key_order() {
        let options = EmbedOptions::default().with_toolbar_list("a,b").with_script_url("");
        let json = serde_json::to_string(&ViewerConfig::new("<mxfile/>", &options)).unwrap();
        assert_eq!(
            json,
            r##"{"edit":"_blank","highlight":"#0000ff","lightbox":false,"nav":true,"resize":true,"toolbar":"a b","xml":"<mxfile/>"}"##
        );
    }

    #[test]
    fn config_puts_dark_mode_first_when_enabled() {
        let options = EmbedOptions::default().with_dark_mode(true);
        let json = serde_json::to_string(&ViewerConfig::new("x", &options)).unwrap();
        assert!(json.starts_with(r#"{"dark-mode":true,"#));
    }

    #[test]
    fn embedded_xml_round_trips_verbatim() {
        let html = render_embed_html(ONE_PAGE, &EmbedOptions::default()).unwrap();
        assert_eq!(html.matches("class=\"mxgraph\"").count(), 1);
        let config = embedded_config(&html);
        assert_eq!(config["xml"], ONE_PAGE);
        assert_eq!(config["toolbar"], "pages zoom layers tags");
    }

    #[test]
    fn toolbar_tokens_join_with_single_spaces() {
        let options = EmbedOptions::default().with_toolbar_list("a,b,c");
        let html = render_embed_html(ONE_PAGE, &options).unwrap();
        assert_eq!(embedded_config(&html)["toolbar"], "a b c");
    }

    #[test]
    fn toolbar_stray_whitespace_survives() {
        let options = EmbedOptions::default().with_toolbar_list(" a , b");
        let html = render_embed_html(ONE_PAGE, &options).unwrap();
        assert_eq!(embedded_config(&html)["toolbar"], " a   b");
    }

    #[test]
    fn dark_mode_key_is_absent_when_off() {
        let html = render_embed_html(ONE_PAGE, &EmbedOptions::default()).unwrap();
        assert!(embedded_config(&html).get("dark-mode").is_none());
    }

    #[test]
    fn dark_mode_key_is_true_when_on() {
        let options = EmbedOptions::default().with_dark_mode(true);
        let html = render_embed_html(ONE_PAGE, &options).unwrap();
        assert_eq!(embedded_config(&html)["dark-mode"], true);
    }

    #[test]
    fn empty_script_url_omits_script_tag() {
        let options = EmbedOptions::default().with_script_url("");
        let html = render_embed_html(ONE_PAGE, &options).unwrap();
        assert!(!html.contains("<script"));
    }

    #[test]
    fn script_tag_carries_url_verbatim() {
        let html = render_embed_html(ONE_PAGE, &EmbedOptions::default()).unwrap();
        assert_eq!(html.matches("<script").count(), 1);
        assert!(html.contains(&format!(
            "<script type=\"text/javascript\" src=\"{DEFAULT_VIEWER_JS}\"></script>\n"
        )));
    }

    #[test]
    fn attribute_payload_is_quote_safe() {
        let input = r#"<mxfile note="it's &amp; friends"/>"#;
        let html = render_embed_html(input, &EmbedOptions::default()).unwrap();
        let start = html.find("data-mxgraph='").unwrap() + "data-mxgraph='".len();
        let end = html[start..].find('\'').unwrap() + start;
        let raw = &html[start..end];
        assert!(!raw.contains('<') && !raw.contains('>') && !raw.contains('"'));
        assert_eq!(embedded_config(&html)["xml"], input);
    }

    #[test]
    fn output_is_three_lines_with_script() {
        let html = render_embed_html(ONE_PAGE, &EmbedOptions::default()).unwrap();
        assert_eq!(html.lines().count(), 3);
        assert!(html.starts_with("<!-- draw.io diagram -->\n"));
    }
}
