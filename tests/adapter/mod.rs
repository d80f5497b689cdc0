//! Vendor adapter tests: framing, parsing, argument building and escaping.

mod args_test;
mod parser_test;
