//! Tests for power models.
