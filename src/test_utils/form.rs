use scraper::ElementRef;

#[track_caller]
pub(crate) fn assert_hx_endpoint(element: &ElementRef<'_>, want: &str, attribute: &str) {
    let got = element
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, want,
        "want element with attribute {attribute}=\"{want}\", got {got:?}"
    );
}
