use super::*;

#[test]
fn accepts_known_reference_forms() {
    let cases = [
        "dQw4w9WgXcQ",
        "  dQw4w9WgXcQ  ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ?t=42",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        "https://m.youtube.com/shorts/dQw4w9WgXcQ",
    ];
    for input in cases {
        let id = RemoteVideoId::parse(input).unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ", "{input}");
    }
}

#[test]
fn rejects_unusable_input() {
    let cases = [
        "",
        "   ",
        "short",
        "not a url at all",
        "https://example.com/watch?v=dQw4w9WgXcQ",
        "https://www.youtube.com/feed/trending",
        "https://youtu.be/",
        "https://www.youtube.com/shorts/",
    ];
    for input in cases {
        let err = RemoteVideoId::parse(input).unwrap_err();
        assert!(matches!(err, OnionError::Source(_)), "{input}: {err}");
    }
}

#[test]
fn display_is_the_bare_id() {
    let id = RemoteVideoId::parse("https://youtu.be/abcdefghijk").unwrap();
    assert_eq!(id.to_string(), "abcdefghijk");
}
