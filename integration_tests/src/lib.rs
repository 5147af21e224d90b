//! End-to-end tests for the Q-structure rendering pipeline. See `tests/`.
