//! Shared test harness modules for the Wayfinder CLI.

use super::*;
