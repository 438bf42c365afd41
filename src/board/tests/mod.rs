//! Unit tests for the task board domain and services.
