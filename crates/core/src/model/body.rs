/// An item whose display body is raw HTML, rendered on each walk step.
pub trait HtmlBody {
    fn html_body(&self) -> &str;
}
