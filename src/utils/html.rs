// src/utils/html.rs

/// Sanitizes user-supplied rich text with ammonia's default whitelist.
///
/// Safe tags such as <b> and <p> survive; <script> (including its body),
/// <iframe> and event-handler attributes are dropped. Used for quiz
/// descriptions and question/option text before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
