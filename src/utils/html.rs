use ammonia;

/// Sanitizes learning-resource article HTML.
///
/// Whitelist-based: formatting tags used in grammar articles (<p>, <b>, <em>,
/// <ul>, <code>, ...) survive; <script>, <iframe> and event-handler attributes
/// are stripped along with script contents.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_formatting_and_drops_scripts() {
        let cleaned = clean_html(r#"<p onclick="x()">Use <b>whom</b> as an object.</p><script>alert(1)</script>"#);
        assert_eq!(cleaned, "<p>Use <b>whom</b> as an object.</p>");
    }
}
