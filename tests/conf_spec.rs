use encoding_rs::{ISO_8859_15, UTF_8, WINDOWS_1252};

use sword_reader::sword::{CipherState, ConfValue};
use sword_reader::{DriverType, ModuleConfig, SwordError};

fn parse(abbreviation: &str, text: &str) -> ModuleConfig {
    ModuleConfig::parse(abbreviation, text.as_bytes()).unwrap()
}

const MINIMAL: &str = "[KJV]\nModDrv=zText\nDataPath=./modules/texts/ztext/kjv/\n";

#[test]
fn minimal_conf() {
    let config = parse("kjv", MINIMAL);
    assert_eq!(config.name, "KJV");
    assert_eq!(config.abbreviation, "kjv");
    assert_eq!(config.driver, DriverType::ZText);
    assert_eq!(config.data_path, "./modules/texts/ztext/kjv/");
    assert_eq!(config.versification, "KJV");
    assert_eq!(config.cipher, CipherState::NotEncrypted);
    assert!(!config.is_locked());
}

#[test]
fn structural_errors() {
    let err = ModuleConfig::parse("x", b"ModDrv=zText\nDataPath=./x/\n").unwrap_err();
    assert!(matches!(err, SwordError::InvalidConf(_)));

    let err = ModuleConfig::parse("x", b"[X]\nDataPath=./x/\n").unwrap_err();
    assert!(matches!(err, SwordError::InvalidConf(_)));

    let err = ModuleConfig::parse("x", b"[X]\nModDrv=zText\n").unwrap_err();
    assert!(matches!(err, SwordError::InvalidConf(_)));

    let err = ModuleConfig::parse("x", b"[X]\nModDrv=FancyNew\nDataPath=./x/\n").unwrap_err();
    assert!(matches!(err, SwordError::UnknownDriverType(d) if d == "FancyNew"));
}

#[test]
fn comments_blank_lines_and_bom() {
    let text = "\u{feff}[Mod]\n\n# a comment\n; another comment\nModDrv=RawText\nDataPath=./m/\n";
    // The BOM arrives as UTF-8 bytes and must not break the header line.
    let config = ModuleConfig::parse("mod", text.as_bytes()).unwrap();
    assert_eq!(config.name, "Mod");
    assert_eq!(config.driver, DriverType::RawText);
}

#[test]
fn backslash_continuation_joins_lines() {
    let config = parse(
        "mod",
        "[Mod]\nModDrv=RawText\nDataPath=./m/\nTextSource=first part \\\nsecond part\n",
    );
    assert_eq!(config.get_str("TextSource"), Some("first part second part"));
}

#[test]
fn burjudson_truncated_continuation() {
    let text = "[BurJudson]\nModDrv=RawText\nDataPath=./m/\n\
                TextSource=The text is available from \nhttp://example.org/\n";
    let config = parse("burjudson", text);
    assert_eq!(
        config.get_str("TextSource"),
        Some("The text is available from http://example.org/")
    );
    // Other modules keep the two lines separate.
    let other = parse("other", text.replace("[BurJudson]", "[Other]").as_str());
    assert_eq!(
        other.get_str("TextSource"),
        Some("The text is available from ")
    );
}

#[test]
fn historical_typos_are_normalized() {
    let config = parse("czeb21", "[CzeB21]\nModDrv=ztext\nDataPath=./m/\nCompressType=Zip\n");
    assert_eq!(config.driver, DriverType::ZText);
    // romcor's lower-case Zip becomes canonical ZIP.
    assert!(config.compression().unwrap().is_some());

    let config = parse("somezld", "[SomeZLD]\nModDrv=zld\nDataPath=./m/\n");
    assert_eq!(config.driver, DriverType::ZLd);

    let config = parse(
        "nheb",
        "[NHEB]\nModDrv=RawText\nDataPath=./m/\nMinumumVersion=1.5.9\n",
    );
    assert_eq!(config.get_str("MinimumVersion"), Some("1.5.9"));
}

#[test]
fn strongsrealgreek_history_line_repair() {
    let config = parse(
        "strongsrealgreek",
        "[StrongsRealGreek]\nModDrv=RawLD\nDataPath=./m/\nHistory=1.4-081031=First release\n",
    );
    match config.get("History") {
        Some(ConfValue::Versioned(pairs)) => {
            assert_eq!(pairs, &[("1.4-081031".to_string(), "First release".to_string())]);
        }
        other => panic!("unexpected History value: {:?}", other),
    }
}

#[test]
fn versioned_fields_collapse_onto_their_base() {
    let config = parse(
        "mod",
        "[Mod]\nModDrv=RawText\nDataPath=./m/\n\
         History_1.0=First\nHistory_1.1=Second\nDescription=Plain\n",
    );
    match config.get("History") {
        Some(ConfValue::Versioned(pairs)) => {
            assert_eq!(
                pairs,
                &[
                    ("1.0".to_string(), "First".to_string()),
                    ("1.1".to_string(), "Second".to_string()),
                ]
            );
        }
        other => panic!("unexpected History value: {:?}", other),
    }
    // Description is versioned even in its bare form.
    match config.get("Description") {
        Some(ConfValue::Versioned(pairs)) => {
            assert_eq!(pairs, &[(String::new(), "Plain".to_string())]);
        }
        other => panic!("unexpected Description value: {:?}", other),
    }
}

#[test]
fn repeated_fields_fold_into_lists() {
    let config = parse(
        "mod",
        "[Mod]\nModDrv=RawText\nDataPath=./m/\n\
         Feature=GreekDef\nFeature=HebrewDef\nLang=en\nLang=en\n",
    );
    assert_eq!(config.features(), vec!["GreekDef", "HebrewDef"]);
    // An identical duplicate stays a single value.
    assert_eq!(config.language(), Some("en"));
}

#[test]
fn encoding_rules() {
    let config = parse("mod", MINIMAL);
    assert_eq!(config.encoding, WINDOWS_1252);

    let config = parse("mod", &format!("{}Encoding=UTF-8\n", MINIMAL));
    assert_eq!(config.encoding, UTF_8);

    // A few modules declare UTF-8 but actually ship Latin-15 text.
    let config = parse("ab", "[AB]\nModDrv=RawCom\nDataPath=./m/\nEncoding=UTF-8\n");
    assert_eq!(config.encoding, ISO_8859_15);

    let err =
        ModuleConfig::parse("mod", format!("{}Encoding=SCSU\n", MINIMAL).as_bytes()).unwrap_err();
    assert!(matches!(err, SwordError::UnsupportedEncoding(e) if e == "SCSU"));
}

#[test]
fn cipher_states() {
    let config = parse("mod", MINIMAL);
    assert_eq!(config.cipher, CipherState::NotEncrypted);
    assert_eq!(config.cipher_key(), None);

    let config = parse("mod", &format!("{}CipherKey=opensesame\n", MINIMAL));
    assert_eq!(config.cipher, CipherState::Unlocked("opensesame".to_string()));
    assert_eq!(config.cipher_key(), Some("opensesame"));

    let config = parse("mod", &format!("{}CipherKey=\n", MINIMAL));
    assert_eq!(config.cipher, CipherState::Locked);
    assert!(config.is_locked());
    assert_eq!(config.cipher_key(), None);
}

#[test]
fn unsupported_compression_is_deferred_to_load() {
    let config = parse("mod", &format!("{}CompressType=LZSS\n", MINIMAL));
    let err = config.compression().unwrap_err();
    assert!(matches!(err, SwordError::UnsupportedCompression(c) if c == "LZSS"));
}

#[test]
fn block_type_variants() {
    use sword_reader::sword::BlockType;

    let config = parse("mod", &format!("{}BlockType=BOOK\n", MINIMAL));
    assert_eq!(config.block_type, Some(BlockType::Book));
    // Clarke declares the mixed-case form.
    let config = parse("clarke", &format!("{}BlockType=Book\n", MINIMAL));
    assert_eq!(config.block_type, Some(BlockType::Book));
    let config = parse("mod", &format!("{}BlockType=CHAPTER\n", MINIMAL));
    assert_eq!(config.block_type, Some(BlockType::Chapter));
}

#[test]
fn latin1_conf_bytes_survive_decoding() {
    // Conf files are read byte-for-byte as Latin-1 regardless of the
    // module's own text encoding.
    let mut bytes = b"[Caf\xe9]\nModDrv=RawText\nDataPath=./m/\n".to_vec();
    bytes.extend_from_slice(b"About=caf\xe9\n");
    let config = ModuleConfig::parse("cafe", &bytes).unwrap();
    assert_eq!(config.name, "Caf\u{e9}");
}

#[test]
fn install_size_parsing() {
    let config = parse("mod", &format!("{}InstallSize=123456\n", MINIMAL));
    assert_eq!(config.install_size(), Some(123456));
    let config = parse("mod", &format!("{}InstallSize=not-a-number\n", MINIMAL));
    assert_eq!(config.install_size(), None);
    assert_eq!(parse("mod", MINIMAL).install_size(), None);
}
