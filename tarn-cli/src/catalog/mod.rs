//! Built-in sample programs for `tarn demo`.
//!
//! Each sample is an assembly source compiled into the binary, with a
//! one-line description of what it does.

/// A sample program.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// Name used on the command line, e.g. `factorial`.
    pub name: &'static str,
    /// Natural-language description of what the program does.
    pub intent: &'static str,
    /// Assembly text.
    pub source: &'static str,
}

/// Every sample, in the order `tarn demo` lists them.
pub const SAMPLES: &[Sample] = &[
    Sample {
        name: "hello",
        intent: "Print a greeting through the print syscall",
        source: include_str!("../../samples/hello.tasm"),
    },
    Sample {
        name: "sum",
        intent: "Sum the integers 1 through 10 with a counting loop",
        source: include_str!("../../samples/sum.tasm"),
    },
    Sample {
        name: "factorial",
        intent: "Recursive factorial of 5",
        source: include_str!("../../samples/factorial.tasm"),
    },
    Sample {
        name: "square",
        intent: "Square a number in a helper function and print it",
        source: include_str!("../../samples/square.tasm"),
    },
    Sample {
        name: "add",
        intent: "Add two arguments in a called function",
        source: include_str!("../../samples/add.tasm"),
    },
];

/// Look a sample up by name, ignoring case.
pub fn find(name: &str) -> Option<&'static Sample> {
    SAMPLES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}
