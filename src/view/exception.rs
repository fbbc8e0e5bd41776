//! Error pages for 404 and 500 responses.

use html_escape::encode_text;

use crate::failure::FailureEnvelope;
use crate::view::layout::DefaultLayout;

const ERROR_TITLE: &str = "There was an Error!";
const NOT_FOUND_TITLE: &str = "Page not Found!";

/// Generic text shown on every 500 page.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Your request could not be completed because there was an error. We apologize for any inconvenience.";

/// Generic text shown on 404 pages when detail is hidden.
pub const GENERIC_NOT_FOUND_MESSAGE: &str = "The page you are looking for does not exist.";

pub struct ExceptionView;

impl ExceptionView {
    /// Page for an internal error.
    ///
    /// The generic message is always present; message, location and
    /// backtrace are added only with `debug`.
    pub fn render500(failure: &FailureEnvelope, debug: bool) -> String {
        let mut main = format!("<p class=\"padding bg-danger\">{}</p>", GENERIC_ERROR_MESSAGE);

        if debug {
            main.push_str(&format!(
                "\n      <p class=\"padding bg-danger\">{}</p>",
                encode_text(&failure.message)
            ));
            if let Some(location) = &failure.location {
                main.push_str(&format!("\n      <p>at <code>{}</code></p>", encode_text(&location.to_string())));
            }
            if let Some(cause) = &failure.cause {
                main.push_str(&format!("\n      <p>caused by: {}</p>", encode_text(cause)));
            }
            if let Some(trace) = &failure.backtrace {
                main.push_str(&format!("\n      <pre>{}</pre>", encode_text(trace)));
            }
        }

        let content = format!(
            "    <header class=\"container\">\n      <h1>{}</h1>\n    </header>\n    <main class=\"container\">\n      {}\n    </main>",
            ERROR_TITLE, main
        );
        DefaultLayout::build(ERROR_TITLE, &content)
    }

    /// Page for a missing route.
    ///
    /// `message` is inserted as-is and must already be HTML-safe; it is shown
    /// only with `debug`.
    pub fn render404(message: &str, debug: bool) -> String {
        let text = if debug && !message.is_empty() {
            message
        } else {
            GENERIC_NOT_FOUND_MESSAGE
        };
        let content = format!(
            "    <header class=\"container\">\n      <h1>{}</h1>\n    </header>\n    <main class=\"container\">\n      <p class=\"padding bg-danger\">{}</p>\n    </main>",
            NOT_FOUND_TITLE, text
        );
        DefaultLayout::build(NOT_FOUND_TITLE, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::SourceLocation;

    fn failure() -> FailureEnvelope {
        FailureEnvelope {
            location: Some(SourceLocation {
                file: "src/handlers/users.rs".into(),
                line: 40,
                column: 9,
            }),
            backtrace: Some("0: maverick::handlers::users::show".into()),
            ..FailureEnvelope::runtime("database password rejected")
        }
    }

    #[test]
    fn test_render500_hides_detail() {
        let page = ExceptionView::render500(&failure(), false);
        assert!(page.contains(GENERIC_ERROR_MESSAGE));
        assert!(!page.contains("database password rejected"));
        assert!(!page.contains("src/handlers/users.rs"));
        assert!(!page.contains("<pre>"));
    }

    #[test]
    fn test_render500_shows_detail() {
        let page = ExceptionView::render500(&failure(), true);
        assert!(page.contains(GENERIC_ERROR_MESSAGE));
        assert!(page.contains("database password rejected"));
        assert!(page.contains("src/handlers/users.rs:40:9"));
        assert!(page.contains("<pre>0: maverick::handlers::users::show</pre>"));
    }

    #[test]
    fn test_render500_escapes_message() {
        let page = ExceptionView::render500(&FailureEnvelope::runtime("<script>x</script>"), true);
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render404() {
        let msg = "No route exists for /secret using method GET and http";
        let hidden = ExceptionView::render404(msg, false);
        assert!(!hidden.contains(msg));
        assert!(hidden.contains(GENERIC_NOT_FOUND_MESSAGE));

        let shown = ExceptionView::render404(msg, true);
        assert!(shown.contains(msg));
        assert!(shown.contains(NOT_FOUND_TITLE));
    }
}
