use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use trivium_cube::Trivium;

fn random_bytes<const N: usize>(rng: &mut StdRng) -> [u8; N] {
    let mut out = [0; N];
    rng.fill_bytes(&mut out);
    out
}

#[test]
fn decrypt_inverts_encrypt() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..16 {
        let key: [u8; 10] = random_bytes(&mut rng);
        let iv: [u8; 10] = random_bytes(&mut rng);
        let len = rng.gen_range(0..300);
        let plaintext: Vec<u8> = (0..len).map(|_| rng.gen_range(0..=255)).collect();

        let ciphertext = Trivium::new(&key, &iv).unwrap().encrypt(&plaintext);
        assert_eq!(ciphertext.len(), plaintext.len());
        let decrypted = Trivium::new(&key, &iv).unwrap().decrypt(&ciphertext);
        assert_eq!(decrypted, plaintext);
    }
}

#[test]
fn reused_keystream_leaks_plaintext_xor() {
    let key = *b"reused key";
    let iv = *b"reused iv.";
    let p1 = b"attack at dawn, bring coffee";
    let p2 = b"retreat at noon, bring tea!!";

    let c1 = Trivium::new(&key, &iv).unwrap().encrypt(p1);
    let c2 = Trivium::new(&key, &iv).unwrap().encrypt(p2);
    for i in 0..p1.len() {
        assert_eq!(c1[i] ^ c2[i], p1[i] ^ p2[i]);
    }

    // Continuing the same instance moves on to fresh keystream.
    let mut cipher = Trivium::new(&key, &iv).unwrap();
    let first = cipher.encrypt(p1);
    let second = cipher.encrypt(p2);
    assert_eq!(first, c1);
    assert_ne!(second, c2);
}

#[test]
fn distinct_ivs_give_distinct_keystreams() {
    let a = Trivium::new(&[7; 10], &[0; 10]).unwrap().keystream(64);
    let b = Trivium::new(&[7; 10], &[1; 10]).unwrap().keystream(64);
    assert_ne!(a, b);
}
