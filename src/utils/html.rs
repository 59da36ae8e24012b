use ammonia;

/// Strip hostile HTML from user-supplied free text (ad descriptions,
/// response messages, rating comments) before it reaches storage.
///
/// Whitelist-based: safe tags survive, <script>/<iframe> and event-handler
/// attributes do not. A fail-safe against stored XSS in any client that
/// renders these fields as HTML.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
