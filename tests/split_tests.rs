use quadlet_unit::{escape_words, split, words, Error, SplitFlags, SplitOptions};

fn args(input: &str) -> Vec<String> {
    SplitOptions::args().split(input).unwrap()
}

#[test]
fn test_escape_then_split_is_identity() {
    let words = ["a b", "c\"d", "plain"];
    let line = escape_words(words);
    assert_eq!(line, "\"a b\" \"c\\\"d\" plain");

    let back = split(&line, None, SplitFlags::UNQUOTE | SplitFlags::RELAX).unwrap();
    assert_eq!(back, words);
}

#[test]
fn test_printable_words_survive() {
    let cases: &[&[&str]] = &[
        &["/usr/bin/podman", "run", "--name=systemd-%N"],
        &["sh", "-c", "echo 'quoted'; exit 0"],
        &["back\\slash", "semi;colon", "it's"],
        &["  padded  ", "tab\tinside"],
        &["ünïcödé", "日本"],
    ];
    for &case in cases {
        assert_eq!(args(&escape_words(case)), case, "case: {case:?}");
    }
}

#[test]
fn test_control_characters_need_cunescape() {
    let words = ["line\nbreak", "bell\u{7}", "cr\r"];
    let line = escape_words(words);
    assert_eq!(line, "\"line\\nbreak\" \"bell\\x07\" \"cr\\r\"");

    let back = SplitOptions::key_vals().split(&line).unwrap();
    assert_eq!(back, words);
}

#[test]
fn test_exec_line_from_unit_value() {
    assert_eq!(
        args("/usr/bin/podman run --env 'A=b c' \"--label=x=y\"  fedora"),
        vec!["/usr/bin/podman", "run", "--env", "A=b c", "--label=x=y", "fedora"]
    );
}

#[test]
fn test_key_vals_decode_escapes() {
    let words = SplitOptions::key_vals()
        .split("PATH=/bin:/usr/bin MSG=\"hello\\tworld\" NL=a\\nb")
        .unwrap();
    assert_eq!(words, vec!["PATH=/bin:/usr/bin", "MSG=hello\tworld", "NL=a\nb"]);
}

#[test]
fn test_custom_separators() {
    let options = SplitOptions::new().with_separators(":");
    assert_eq!(options.split("a:b::c").unwrap(), vec!["a", "b", "c"]);

    let options = options.with_flags(SplitFlags::DONT_COALESCE_SEPARATORS);
    assert_eq!(options.split("a:b::c").unwrap(), vec!["a", "b", "", "c"]);
}

#[test]
fn test_lazy_iteration() {
    let input = "first second third fourth";
    let taken: Vec<String> = words(input, None, SplitFlags::empty())
        .take(2)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(taken, vec!["first", "second"]);
}

#[test]
fn test_errors_carry_offsets() {
    assert_eq!(
        split("run \"unclosed", None, SplitFlags::UNQUOTE).unwrap_err(),
        Error::UnterminatedQuote { offset: 13 }
    );
    assert_eq!(
        split("run \\", None, SplitFlags::empty()).unwrap_err(),
        Error::TrailingBackslash { offset: 5 }
    );

    let err = split("bad \\z", None, SplitFlags::CUNESCAPE).unwrap_err();
    assert!(err.is_tokenize_error());
    assert!(!err.is_parse_error());
}

#[test]
fn test_relax_accepts_sloppy_input() {
    assert_eq!(args("run \"unclosed"), vec!["run", "unclosed"]);
    assert_eq!(args("trailing \\"), vec!["trailing"]);
}
