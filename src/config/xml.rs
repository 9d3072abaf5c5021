//! Minimal indenting XML writer for server config fragments

/// Root element of every config fragment
pub const ROOT_ELEMENT: &str = "yandex";

const INDENT: &str = "    ";

/// Escape text for use as XML character data
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// True if `name` can be written as an element name as-is
///
/// Accepts an ASCII letter or `_` followed by letters, digits, `_`, `-` and
/// `.`. Namespaced names are rejected.
pub fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Writes a `<yandex>`-rooted document, one element per line
#[derive(Debug)]
pub struct XmlWriter {
    buf: String,
    depth: usize,
}

impl XmlWriter {
    /// Start a document with the root element open
    pub fn document() -> Self {
        let mut writer = Self {
            buf: String::new(),
            depth: 0,
        };
        writer.open(ROOT_ELEMENT);
        writer
    }

    /// Open an element
    pub fn open(&mut self, tag: &str) -> &mut Self {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
        self.depth += 1;
        self
    }

    /// Close the innermost element, which must be `tag`
    pub fn close(&mut self, tag: &str) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push_str(">\n");
        self
    }

    /// Write `<tag>text</tag>` on one line
    pub fn element(&mut self, tag: &str, text: impl std::fmt::Display) -> &mut Self {
        self.indent();
        self.buf
            .push_str(&format!("<{tag}>{}</{tag}>\n", escape(&text.to_string())));
        self
    }

    /// Close the root element and return the document
    pub fn finish(mut self) -> String {
        self.close(ROOT_ELEMENT);
        self.buf
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_nested_elements_are_indented() {
        let mut w = XmlWriter::document();
        w.open("zookeeper");
        w.open("node").element("host", "zk-0").element("port", 2181).close("node");
        w.close("zookeeper");

        assert_eq!(
            w.finish(),
            "<yandex>\n\
             \x20   <zookeeper>\n\
             \x20       <node>\n\
             \x20           <host>zk-0</host>\n\
             \x20           <port>2181</port>\n\
             \x20       </node>\n\
             \x20   </zookeeper>\n\
             </yandex>\n"
        );
    }

    #[test]
    fn story_text_is_escaped() {
        assert_eq!(escape("a<b & \"c\"'"), "a&lt;b &amp; &quot;c&quot;&apos;");

        let mut w = XmlWriter::document();
        w.element("password", "p&ss>");
        assert!(w.finish().contains("<password>p&amp;ss&gt;</password>"));
    }

    #[test]
    fn story_element_names_are_checked() {
        for name in ["events", "_private", "archive-shard", "max.bytes", "shard2"] {
            assert!(is_valid_element_name(name), "{name} should be accepted");
        }
        for name in ["", "my cluster", "2nd", "-lead", "a<b", "a/b", "x:y", "naïve"] {
            assert!(!is_valid_element_name(name), "{name} should be rejected");
        }
    }

    #[test]
    fn story_empty_document_is_just_the_root() {
        assert_eq!(XmlWriter::document().finish(), "<yandex>\n</yandex>\n");
    }
}
