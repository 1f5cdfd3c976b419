pub mod calendar;
pub mod convert;
pub mod document;
pub mod fetch;
pub mod index;
pub mod locations;
pub mod output;
pub mod parser;
pub mod synth;
pub mod timetable;
