//! Text normalization for station name matching.
//!
//! Station names mix French and English and carry accents ("Métro",
//! "Côte-des-Neiges"). Both query and name are lowercased, stripped of
//! diacritics and whitespace-collapsed before comparison.

/// Normalize `s` for comparison.
///
/// # Examples
///
/// ```
/// use bixi_server::stations::normalize;
///
/// assert_eq!(normalize("  Métro   Champ-de-Mars "), "metro champ-de-mars");
/// assert_eq!(normalize("CÔTE-DES-NEIGES"), "cote-des-neiges");
/// ```
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            push_folded(&mut out, c);
        }
    }

    out
}

fn push_folded(out: &mut String, c: char) {
    // Combining marks from decomposed input (e.g. "e\u{301}").
    if ('\u{300}'..='\u{36f}').contains(&c) {
        return;
    }

    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ł' | 'ľ' | 'ĺ' | 'ļ' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        'æ' => return out.push_str("ae"),
        'œ' => return out.push_str("oe"),
        'ß' => return out.push_str("ss"),
        '\u{2018}' | '\u{2019}' | '\u{2032}' => '\'',
        '\u{2010}'..='\u{2015}' => '-',
        other => other,
    };
    out.push(folded);
}
