//! envseal demo main.rs
//! Demonstrates the encrypting envelope:
//! - AES-CBC sealing with multi-key trial opening
//! - embedding sealed bytes inside a larger document
//! - RSA-OAEP sealing with a bound label

use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use envseal::{AesEnvelope, Json, RsaEnvelope};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Secret {
    field: String,
}

#[derive(Serialize, Deserialize)]
struct Document {
    insecure: String,
    #[serde(with = "serde_bytes")]
    secure: Vec<u8>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- 1. Seal with one key, open with a key ring ---
    let correct = b"0123456789ABCDEF".to_vec();
    let wrong = b"FEDCBA9876543210".to_vec();

    let payload = Secret {
        field: "hello".to_owned(),
    };
    let wire = AesEnvelope::new(vec![correct.clone()]).seal::<Json, _>(&payload)?;
    println!("AES sealed frame: {} bytes", wire.len());

    let opener = AesEnvelope::new(vec![wrong.clone(), correct.clone()]);
    let opened: Secret = opener.open::<Json, _>(&wire)?;
    println!("opened with second key in the ring: {:?}", opened);
    assert_eq!(opened, payload);

    // A ring without the sealing key must fail.
    let res = AesEnvelope::new(vec![wrong]).open::<Json, Secret>(&wire);
    println!("wrong-key ring rejected as expected: {:?}", res.err());

    // --- 2. Embed the sealed bytes inside a larger document ---
    let doc = Document {
        insecure: "hello".to_owned(),
        secure: AesEnvelope::new(vec![correct.clone()]).seal::<Json, _>(&Secret {
            field: "world!".to_owned(),
        })?,
    };
    let doc_wire = serde_json::to_vec(&doc)?;
    let doc_back: Document = serde_json::from_slice(&doc_wire)?;
    let embedded: Secret =
        AesEnvelope::new(vec![correct]).open::<Json, _>(&doc_back.secure)?;
    println!("embedded payload: {:?}", embedded);

    // --- 3. RSA with a label bound into the ciphertext ---
    println!("generating a 2048-bit RSA key...");
    let private = RsaPrivateKey::new(&mut OsRng, 2048)?;
    let public = RsaPublicKey::from(&private);

    let sealer = RsaEnvelope {
        enc_key: Some(public),
        label: "demo label".to_owned(),
        ..RsaEnvelope::default()
    };
    let rsa_wire = sealer.seal::<Json, _>(&Secret {
        field: "world!".to_owned(),
    })?;
    println!("RSA sealed frame: {} bytes", rsa_wire.len());

    let opener = RsaEnvelope {
        dec_keys: vec![private.clone()],
        label: "demo label".to_owned(),
        ..RsaEnvelope::default()
    };
    let rsa_opened: Secret = opener.open::<Json, _>(&rsa_wire)?;
    println!("RSA opened: {:?}", rsa_opened);

    // Mismatched label behaves like a wrong key.
    let bad_label = RsaEnvelope::with_keys(vec![private]);
    let res = bad_label.open::<Json, Secret>(&rsa_wire);
    println!("mismatched label rejected as expected: {:?}", res.err());

    println!("done.");
    Ok(())
}
