//! Cross-module scenario tests: raw NOAA JSON in, rendered calendars out.
