//! Transliteration and URL-safe slugs

/// ASCII replacement for a Central-European letter
fn latin(c: char) -> Option<&'static str> {
    let s = match c {
        'ç' | 'ć' | 'č' => "c",
        'Ć' | 'Č' => "C",
        'Á' | 'Ą' => "A",
        'á' | 'ą' => "a",
        'É' | 'Ę' => "E",
        'é' | 'ę' => "e",
        'Í' => "I",
        'í' => "i",
        'Ó' | 'Ő' => "O",
        'ó' | 'ő' => "o",
        'Ú' | 'Ű' => "U",
        'ú' | 'ű' => "u",
        'Ö' => "OE",
        'ö' => "oe",
        'Ü' => "UE",
        'ü' => "ue",
        'Ä' => "AE",
        'ä' => "ae",
        'Ł' => "L",
        'ł' => "l",
        'Ń' => "N",
        'ń' => "n",
        'Ś' | 'Š' => "S",
        'ś' | 'š' => "s",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        'Đ' => "DJ",
        'đ' => "dj",
        'ß' | 'ẞ' => "ss",
        _ => return None,
    };
    Some(s)
}

/// Replace Croatian, Hungarian, Polish and German diacritics with ASCII
pub fn to_latin(foreign: &str) -> String {
    let mut out = String::with_capacity(foreign.len());
    for c in foreign.chars() {
        match latin(c) {
            Some(s) => out.push_str(s),
            None => out.push(c),
        }
    }
    out
}

/// Lowercase, dash-separated, ASCII-only form of `raw` for URLs, user names
/// and e-mail local parts
pub fn sanitize_for_url(raw: &str) -> String {
    let mut result = raw.trim().to_lowercase().replace(' ', "-");
    while result.contains("--") {
        result = result.replace("--", "-");
    }
    let result = to_latin(&result);

    let mut checked: String = result
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    if checked.starts_with('-') {
        checked.remove(0);
    }
    if checked.ends_with('-') {
        checked.pop();
    }
    checked
}
