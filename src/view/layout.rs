use html_escape::encode_text;

/// Minimal HTML5 page shell.
pub struct DefaultLayout;

impl DefaultLayout {
    pub fn build(title: &str, content: &str) -> String {
        format!(
            "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
  <head>\n\
    <meta charset=\"utf-8\">\n\
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
    <title>{}</title>\n\
  </head>\n\
  <body>\n\
{}\n\
  </body>\n\
</html>\n",
            encode_text(title),
            content
        )
    }
}
