//! Accent-escape decoding tests

use pubshelf_bibtex::decode_latex;
use rstest::rstest;

#[rstest]
#[case(r"\'e", "é")]
#[case(r"{\'e}", "é")]
#[case(r"\'{e}", "é")]
#[case(r"{\'{e}}", "é")]
#[case(r#"\"u"#, "ü")]
#[case(r#"{\"u}"#, "ü")]
#[case(r"\c c", "ç")]
#[case(r"\c{c}", "ç")]
#[case(r"{\c c}", "ç")]
#[case(r"\`A", "À")]
#[case(r"\^o", "ô")]
#[case(r"\~n", "ñ")]
#[case(r"\r{a}", "å")]
#[case(r"{\aa}", "å")]
#[case(r"{\ae}", "æ")]
#[case(r"\AE{}", "Æ")]
#[case(r"{\ss}", "ß")]
#[case(r"\o", "ø")]
#[case(r"{\O}", "Ø")]
fn test_escape_table(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(decode_latex(input), expected);
}

#[rstest]
#[case(r"\'x")]
#[case(r"{\~q}")]
#[case(r"\c{z}")]
#[case(r"\textsuperscript{2}")]
#[case(r"\unknownmacro")]
fn test_unrecognized_escape_passes_through(#[case] input: &str) {
    assert_eq!(decode_latex(input), input);
}

#[rstest]
#[case("{Robot}", "Robot")]
#[case("{{Robot}}", "Robot")]
#[case("The {dVRK}: {A} {Review}", "The dVRK: A Review")]
#[case("plain text", "plain text")]
fn test_plain_groups_collapse(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(decode_latex(input), expected);
}

#[test]
fn test_mixed_author_list() {
    let input = r#"Mu{\~n}oz, V. F. and Garc{\'\i}a-Morales, I. and {\"O}zg{\"u}ner, {\c{C}}a{\u g}lar"#;
    assert_eq!(
        decode_latex(input),
        "Muñoz, V. F. and García-Morales, I. and Özgüner, Çağlar"
    );
}
