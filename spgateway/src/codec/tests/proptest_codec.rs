use std::sync::Arc;

use proptest::prelude::*;

use crate::{
    Credential,
    codec::{BlockCipherCodec, CheckValueEngine, ParamMap, UnpadMode, cipher::PAD_BLOCK_SIZE},
};

fn credential() -> Arc<Credential> {
    Arc::new(
        Credential::new("MS12345", "0123456789abcdef0123456789abcdef", "0123456789abcdef")
            .unwrap(),
    )
}

const CARD_PAYMENT_FIELDS: [&str; 5] = ["Amt", "MerchantID", "MerchantOrderNo", "TimeStamp", "Version"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_strict_roundtrip_any_bytes(plaintext in proptest::collection::vec(any::<u8>(), 0..10_000)) {
        let codec = BlockCipherCodec::with_unpad_mode(credential(), UnpadMode::Strict);
        let blob = codec.encode(&plaintext);
        prop_assert_eq!(codec.decode(blob.as_str()).unwrap(), plaintext);
    }

    #[test]
    fn test_compat_roundtrip_printable(plaintext in "[!-~]{0,2000}") {
        let codec = BlockCipherCodec::new(credential());
        let blob = codec.encode(&plaintext);
        prop_assert_eq!(codec.decode_str(blob.as_str()).unwrap(), plaintext);
    }

    #[test]
    fn test_ciphertext_length(plaintext in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let codec = BlockCipherCodec::new(credential());
        let blob = codec.encode(&plaintext);
        let padded = (plaintext.len() / PAD_BLOCK_SIZE + 1) * PAD_BLOCK_SIZE;
        prop_assert_eq!(blob.len(), padded * 2);
        prop_assert!(blob.as_str().bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn test_check_value_ignores_insertion_order(
        values in proptest::collection::vec("[A-Za-z0-9.]{1,20}", 5),
        order in Just((0..5).collect::<Vec<usize>>()).prop_shuffle(),
        extra in "[a-z]{1,10}",
    ) {
        let engine = CheckValueEngine::new(credential());

        let sorted: ParamMap =
            CARD_PAYMENT_FIELDS.iter().zip(&values).map(|(k, v)| (*k, v.as_str())).collect();
        let mut shuffled: ParamMap =
            order.iter().map(|&i| (CARD_PAYMENT_FIELDS[i], values[i].as_str())).collect();
        shuffled.insert("ItemDesc", extra.as_str());

        let expected = engine.compute_check_value("card-payment", &sorted).unwrap();
        let actual = engine.compute_check_value("card-payment", &shuffled).unwrap();
        prop_assert_eq!(expected.as_str().len(), 64);
        prop_assert!(expected.as_str().bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)));
        prop_assert_eq!(expected, actual);
    }
}
