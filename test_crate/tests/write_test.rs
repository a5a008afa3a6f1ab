use propline::{escape, unescape, Error, Line, PropertiesWriter, PropertyModel, WriterConfig};
use rstest::rstest;
use test_crate::{parse, unix, write};

fn single(key: &str, value: &str) -> PropertyModel {
    let mut model = PropertyModel::new();
    model.add_line(Line::property(key, value).unwrap());
    model
}

fn narrow() -> WriterConfig {
    unix()
        .with_value_indent(2)
        .with_line_length(20)
        .with_wrap_indent(4)
}

#[test]
pub fn layout() {
    let mut model = PropertyModel::new();
    model.add_line(Line::comment("# header").unwrap());
    model.add_line(Line::Empty);
    model.add_line(Line::property("k", "v").unwrap());
    model.add_line(Line::property("k2", "v2").unwrap());

    assert_eq!(
        write(&model, &unix()),
        "# header\n\nk                       = v\nk2                      = v2\n"
    );
}

#[test]
pub fn long_key_is_not_padded() {
    let key = "a.very.long.key.that.is.longer";
    assert_eq!(write(&single(key, "v"), &unix()), format!("{key}= v\n"));
}

#[test]
pub fn crlf_separator() {
    let config = unix().with_line_separator("\r\n").with_value_indent(0);
    assert_eq!(write(&parse("# c\n\nk=v\n"), &config), "# c\r\n\r\nk= v\r\n");
}

#[rstest]
#[case("a b", "a\\ b")]
#[case("a:b", "a\\:b")]
#[case("a=b", "a\\=b")]
#[case("#notacomment", "\\#notacomment")]
#[case("!bang", "\\!bang")]
#[case("a#b!", "a#b!")]
#[case(" lead", "\\ lead")]
#[case("tab\there", "tab\\there")]
#[case("back\\slash", "back\\\\slash")]
#[case("gr\u{fc}\u{df}", "gr\u{fc}\u{df}")]
#[case("\u{20AC}", "\\u20AC")]
pub fn key_escaping(#[case] key: &str, #[case] written: &str) {
    let config = unix().with_value_indent(0);
    let text = write(&single(key, "v"), &config);
    assert_eq!(text, format!("{written}= v\n"));

    let back = parse(&text);
    assert_eq!(back.property(key).map(|p| p.value()), Some("v"), "{text}");
}

#[test]
pub fn commented_key_round_trip() {
    let text = write(&single("#notacomment", "5"), &unix().with_value_indent(0));
    assert_eq!(text, "\\#notacomment= 5\n");

    let back = parse(&text);
    assert_eq!(back.lines(), &[Line::property("#notacomment", "5").unwrap()]);
}

#[rstest]
#[case(" foo", "\\ foo")]
#[case("  two", "\\  two")]
#[case("a b c", "a b c")]
#[case("\u{e4}\u{f6}\u{fc}", "\u{e4}\u{f6}\u{fc}")]
#[case("\u{20AC}", "\\u20AC")]
#[case("\u{1D54A}", "\\uD835\\uDD4A")]
#[case("\u{1}\u{7F}\u{80}\u{9F}\u{A0}", "\\u0001\u{7F}\\u0080\\u009F\u{A0}")]
#[case("a\\b", "a\\\\b")]
#[case("=x", "=x")]
pub fn value_escaping(#[case] value: &str, #[case] written: &str) {
    let config = unix().with_value_indent(0);
    assert_eq!(write(&single("k", value), &config), format!("k= {written}\n"));
}

#[test]
pub fn latin1_is_written_as_single_bytes() {
    let bytes = single("k", "\u{e4}").to_bytes(&unix().with_value_indent(0)).unwrap();
    assert_eq!(bytes, b"k= \xe4\n");
}

#[test]
pub fn comment_escaping() {
    let mut model = PropertyModel::new();
    model.add_line(Line::comment("# caf\u{e9} \u{20AC} \\").unwrap());
    assert_eq!(write(&model, &unix()), "# caf\u{e9} \\u20AC \\\\\n");
}

#[test]
pub fn comments_are_not_wrapped() {
    let comment = format!("# {}", "x".repeat(100));
    let mut model = PropertyModel::new();
    model.add_line(Line::comment(comment.clone()).unwrap());
    assert_eq!(write(&model, &narrow()), format!("{comment}\n"));
}

#[test]
pub fn short_value_is_not_wrapped() {
    assert_eq!(write(&single("k", "short"), &narrow()), "k = short\n");
}

#[test]
pub fn hard_wrap() {
    let value = "x".repeat(30);
    let text = write(&single("k", &value), &narrow());
    assert_eq!(
        text,
        format!("k = \\\n    {}\\\n    {}\n", "x".repeat(16), "x".repeat(14))
    );
    assert_eq!(parse(&text).property("k").unwrap().value(), value);
}

#[test]
pub fn wrap_at_space() {
    let value = format!("{} {}", "a".repeat(12), "b".repeat(17));
    let text = write(&single("k", &value), &narrow());
    assert_eq!(
        text,
        format!(
            "k = \\\n    {} \\\n    {}\\\n    b\n",
            "a".repeat(12),
            "b".repeat(16)
        )
    );
    assert_eq!(parse(&text).property("k").unwrap().value(), value);
}

#[test]
pub fn segment_starting_with_space_is_escaped() {
    let value = format!("{}  tail", "x".repeat(16));
    let text = write(&single("k", &value), &narrow());
    assert_eq!(
        text,
        format!("k = \\\n    {}\\\n    \\  tail\n", "x".repeat(16))
    );
    assert_eq!(parse(&text).property("k").unwrap().value(), value);
}

#[test]
pub fn embedded_line_breaks_are_wrapped() {
    let text = write(&single("k", "one\ntwo"), &narrow());
    assert_eq!(text, "k = \\\n    one\\n\\\n    two\n");
    assert_eq!(parse(&text).property("k").unwrap().value(), "one\ntwo");
}

#[test]
pub fn wrapping_disabled() {
    let value = format!("{}\n{}", "x".repeat(100), "y".repeat(100));
    let config = narrow().with_line_length(0);
    let text = write(&single("k", &value), &config);
    assert_eq!(text, format!("k = {}\\n{}\n", "x".repeat(100), "y".repeat(100)));
}

#[test]
pub fn default_layout_wraps_long_values() {
    let value = "word ".repeat(30);
    let text = write(&single("message", &value), &unix());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert_eq!(lines[0], format!("message{}= \\", " ".repeat(17)));
    assert!(lines[1].starts_with("    word "));
    assert_eq!(parse(&text).property("message").unwrap().value(), value);
}

#[test]
pub fn unencoded_character_is_rejected() {
    let mut out = Vec::new();
    let mut writer = PropertiesWriter::new(&mut out);
    let err = writer.write_raw("ok\u{20AC}").unwrap_err();
    assert!(matches!(err, Error::Unencoded('\u{20AC}')));
    drop(writer);
    assert!(out.is_empty());
}

#[test]
pub fn writer_steps() {
    let mut out = Vec::new();
    let mut writer = PropertiesWriter::with_config(&mut out, unix().with_value_indent(6));
    let mark = writer.write_key("a b").unwrap();
    writer.write_raw("= ").unwrap();
    writer.write_wrappable(" v", mark + 2).unwrap();
    writer.new_line().unwrap();
    writer.write_wrap_indent().unwrap();
    writer.write_escaped("x").unwrap();
    writer.flush().unwrap();

    assert_eq!(mark, 6);
    assert_eq!(out, b"a\\ b   = \\ v\n    x");
}

#[rstest]
#[case("")]
#[case("plain")]
#[case(" foo")]
#[case("  two leading")]
#[case("trailing  ")]
#[case("a\\b\\")]
#[case("\t\r\n\x0C")]
#[case("\u{e4}\u{f6}\u{fc}\u{df}")]
#[case("\u{20AC}\u{4E2D}\u{6587}")]
#[case("\u{1D54A}\u{1F600}")]
#[case("\u{0}\u{7F}\u{80}\u{9F}\u{A0}\u{FF}\u{100}\u{FFFF}\u{10FFFF}")]
#[case("#!=: ")]
pub fn escape_unescape_inverse(#[case] text: &str) {
    assert_eq!(unescape(&escape(text, false)).unwrap(), text);
    assert_eq!(unescape(&escape(text, true)).unwrap(), text);
}

#[test]
pub fn leading_space_escape_is_asymmetric() {
    assert_eq!(escape(" foo", true), "\\ foo");
    assert_eq!(escape(" foo", false), " foo");
    assert_eq!(escape("a b", true), "a b");
    assert_eq!(unescape("\\ foo").unwrap(), " foo");
    assert_eq!(unescape(" foo").unwrap(), " foo");
}
