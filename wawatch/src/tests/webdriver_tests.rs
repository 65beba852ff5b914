use crate::errors::WatchError;
use crate::selector::Selector;
use crate::webdriver::to_xpath;

#[test]
fn title_selector_queries_the_title_attribute() {
    let xpath = to_xpath(&Selector::title("Alice")).unwrap();
    assert_eq!(xpath, "//span[@title='Alice']");
}

#[test]
fn text_selector_is_case_insensitive() {
    let xpath = to_xpath(&Selector::text_contains("Last Seen")).unwrap();
    assert!(xpath.contains("translate(text()"));
    assert!(xpath.contains("'last seen'"), "needle must be lowercased: {xpath}");
}

#[test]
fn header_scoping_prefixes_the_region() {
    let xpath =
        to_xpath(&Selector::text_contains("online").within(Selector::header())).unwrap();
    assert!(xpath.starts_with("//header//span[contains("), "{xpath}");
}

#[test]
fn quotes_in_contact_names_are_representable() {
    // Apostrophes switch to double quoting.
    let xpath = to_xpath(&Selector::title("O'Brien")).unwrap();
    assert_eq!(xpath, "//span[@title=\"O'Brien\"]");

    // Mixed quotes fall back to concat(); XPath 1.0 has no escaping.
    let xpath = to_xpath(&Selector::title(r#"O'Brien "Bob""#)).unwrap();
    assert!(xpath.contains("concat("), "{xpath}");
}

#[test]
fn invalid_selectors_are_rejected() {
    let result = to_xpath(&Selector::Invalid("bad".to_string()));
    assert!(matches!(result, Err(WatchError::Session(_))));
}
