//! Cross-module test suite: end-to-end prediction scenarios against the
//! bundled San Francisco constants, and cache behavior under concurrency.
