//! Property-based tests for input parsing and query escaping

mod tokenizer;
