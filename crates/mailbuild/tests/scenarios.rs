//! Cross-cutting end-to-end scenarios, one per concrete example in the
//! design's "testable properties" section: base64 line wrapping, a
//! quoted-printable body with mixed ASCII/non-ASCII content, a rich-text
//! (plain + HTML) alternative message with a fixed boundary, and a fully
//! nested mixed/alternative/related message carrying an inline image.

use mailbuild::{
    encode_base64, encode_header_value, encode_parameter, encode_quoted_printable, Body, CharsetEncoder,
    FragmentSource, MailAddress, MessageBuilder, MimePart, Person,
};
use rand::SeedableRng;

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(7)
}

#[test]
fn base64_wraps_57_byte_groups_into_76_char_lines() {
    let mut payload = vec![0xABu8; 57];
    payload.extend_from_slice(&[1, 2, 3, 4, 5]);
    let out = encode_base64(&payload);
    let lines: Vec<&str> = out.split("\r\n").filter(|l| !l.is_empty()).collect();
    k9::assert_equal!(lines.len(), 2);
    assert!(lines[0].len() <= 76);
    assert!(lines[1].ends_with('='));
}

#[test]
fn quoted_printable_mixes_ascii_and_utf8() {
    let text = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ\n!こんにちは";
    let out = encode_quoted_printable(text.as_bytes());
    let out_str = String::from_utf8_lossy(&out);
    for line in out_str.split("\r\n") {
        assert!(line.len() <= 76, "line too long: {line:?}");
    }
    // Every multi-byte UTF-8 scalar becomes a run of `=HH` triplets.
    assert!(out_str.contains("=E3=81=93")); // こ
}

#[test]
fn iso_2022_jp_subject_and_body_scenario() {
    let charset = CharsetEncoder::for_label("iso-2022-jp").unwrap();
    let subject = "My First Mail Message. - 私の初めてのメールメッセージ -";
    let body = "Hello, World!\r\nこんにちは、世界！";

    let mut b = MessageBuilder::new();
    b.set_charset(charset);
    b.set_from(vec![Person::new(MailAddress::parse("author@example.com").unwrap())]);
    b.set_to(vec![Person::new(MailAddress::parse("recipient@example.com").unwrap())]);
    b.set_subject(subject).unwrap();
    b.text_plain(body);

    let out_bytes = b.build(&mut rng()).unwrap();
    let out = String::from_utf8(out_bytes.clone()).unwrap();

    // Header order: From, To, Subject, then the derived Content-Type and
    // Content-Transfer-Encoding, per spec §4.5.
    let from_pos = out.find("From:").unwrap();
    let to_pos = out.find("To:").unwrap();
    let subject_pos = out.find("Subject:").unwrap();
    let content_type_pos = out.find("Content-Type:").unwrap();
    let cte_pos = out.find("Content-Transfer-Encoding:").unwrap();
    assert!(from_pos < to_pos);
    assert!(to_pos < subject_pos);
    assert!(subject_pos < content_type_pos);
    assert!(content_type_pos < cte_pos);

    // The Subject header line is byte-for-byte what the RFC 2047 tokenizer
    // produces for this exact input at the column "Subject: " leaves it.
    let expected_subject_line = format!("Subject: {}\r\n", encode_header_value(charset, subject, 9).unwrap());
    assert!(
        out.contains(&expected_subject_line),
        "expected subject line not found verbatim in:\n{out}"
    );
    assert!(expected_subject_line.contains("=?iso-2022-jp?B?"));
    // At least one encoded word is followed by a fold onto a continuation
    // line (`CRLF SP`), since the run starting at column 9 overflows the
    // 76-column fold budget.
    assert!(expected_subject_line.contains("\r\n "));

    assert!(out.contains("Content-Type: text/plain; charset=iso-2022-jp\r\n"));
    assert!(out.contains("Content-Transfer-Encoding: 7bit\r\n"));

    // Body bytes are exactly the ISO-2022-JP-escaped form of `body`,
    // written after the header/body blank-line separator.
    let header_end = out.find("\r\n\r\n").unwrap();
    let expected_body = charset.encode(body).unwrap();
    k9::assert_equal!(out_bytes[header_end + 4..].to_vec(), expected_body);
}

#[test]
fn rfc2231_filename_continuation_iso_2022_jp_ja() {
    let charset = CharsetEncoder::for_label("iso-2022-jp").unwrap();
    let filename = "とてもとても長い長い日本語の名前のファイル.txt";

    let segments = encode_parameter("filename", filename, charset, Some("ja")).unwrap();

    assert!(
        segments.len() >= 2,
        "expected the filename to need RFC 2231 continuation, got {segments:?}"
    );
    assert!(segments[0].starts_with("filename*0*=iso-2022-jp'ja'"));
    for (i, segment) in segments.iter().enumerate() {
        assert!(segment.starts_with(&format!("filename*{i}*=")));
        assert!(segment.len() <= 75, "segment {i} exceeds 75 bytes: {segment:?}");
    }
    assert!(segments.last().unwrap().ends_with(".txt"));
}

#[test]
fn rich_text_alternative_with_fixed_boundary() {
    let plain = MimePart::new_leaf(
        Body::PlainText {
            text: "hello".into(),
            charset: CharsetEncoder::Utf8,
        },
        CharsetEncoder::Utf8,
    )
    .unwrap();
    let html = MimePart::new_leaf(
        Body::HtmlContent {
            html: "<p>hello</p>".into(),
            charset: CharsetEncoder::Utf8,
        },
        CharsetEncoder::Utf8,
    )
    .unwrap();
    let multi = MimePart::new_multipart("alternative", vec![plain, html], "test-boundary").unwrap();

    let mut out = Vec::new();
    multi.write(&mut out, CharsetEncoder::Utf8).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("Content-Type: multipart/alternative; boundary=test-boundary\r\n"));
    k9::assert_equal!(text.matches("--test-boundary\r\n").count(), 2);
    assert!(text.ends_with("--test-boundary--\r\n"));
}

#[test]
fn file_attached_message_nests_mixed_alternative_related() {
    let mut b = MessageBuilder::new();
    b.set_from(vec![Person::new(
        MailAddress::parse("sender@example.com").unwrap(),
    )]);
    b.set_to(vec![Person::new(
        MailAddress::parse("recipient@example.com").unwrap(),
    )]);
    b.set_subject("With attachments").unwrap();
    b.text_plain("plain body");
    b.text_html("<p>html body</p><img src=\"cid:logo@local\">");
    b.attach_inline(Body::FileAttached {
        mime: mailbuild::MimeValue::new("image", "png"),
        filename: Some("logo.png".into()),
        content_id: "logo@local".into(),
        source: FragmentSource::from_bytes(vec![1, 2, 3, 4]),
    });
    b.attach(Body::File {
        mime: mailbuild::MimeValue::new("application", "pdf"),
        filename: Some("report.pdf".into()),
        content_id: None,
        source: FragmentSource::from_bytes(vec![5, 6, 7, 8]),
    });

    let out = String::from_utf8(b.build(&mut rng()).unwrap()).unwrap();

    assert!(out.contains("Content-Type: multipart/mixed;"));
    assert!(out.contains("Content-Type: multipart/related;"));
    assert!(out.contains("Content-Type: multipart/alternative;"));
    assert!(out.contains("Content-Type: text/plain; charset=utf-8"));
    assert!(out.contains("Content-Type: text/html; charset=utf-8"));
    assert!(out.contains("Content-Type: image/png"));
    assert!(out.contains("Content-Type: application/pdf"));
    assert!(out.contains("Content-ID: <logo@local>"));
    assert!(out.contains("Content-Disposition: inline; filename=logo.png"));
    assert!(out.contains("Content-Disposition: attachment; filename=report.pdf"));

    let mixed_pos = out.find("multipart/mixed").unwrap();
    let related_pos = out.find("multipart/related").unwrap();
    let alternative_pos = out.find("multipart/alternative").unwrap();
    assert!(mixed_pos < related_pos);
    assert!(related_pos < alternative_pos);
}

#[test]
fn mail_address_parser_error_scenarios() {
    use mailbuild::AddressError;

    k9::assert_equal!(
        MailAddress::parse("foo@bar@example.com"),
        Err(AddressError::DuplicateAtSigns)
    );
    k9::assert_equal!(
        MailAddress::parse(".foo@example.com"),
        Err(AddressError::InvalidDotPosition)
    );
    k9::assert_equal!(
        MailAddress::parse("\"foo\"\"bar\"@example.com"),
        Err(AddressError::InvalidQuotedStringPosition)
    );
    let long_domain = "foo.".repeat(70) + "com";
    k9::assert_equal!(
        MailAddress::parse(&format!("a@{long_domain}")),
        Err(AddressError::TooLong)
    );
}
