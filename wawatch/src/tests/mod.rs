//! Browser-free unit tests, driven by an in-memory fake page session.

mod fake_page;

mod logger_tests;
mod webdriver_tests;
