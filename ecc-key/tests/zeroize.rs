//! Private scalars must not survive in freed heap memory.
//!
//! A wrapping global allocator inspects every block as it is released and
//! counts the ones that still contain the scalar, in either byte order.

use ecc_key::{EcPrivateKey, NamedCurve, ecdh, ecdsa, num_bigint::BigUint};
use hex_literal::hex;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::{
    alloc::{GlobalAlloc, Layout, System},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

const SCALAR: [u8; 32] =
    hex!("C9AFA9D845BA75166B5C215767B1D6934E50C3DB36E89B127B8A622B120F6721");

const DIGEST: [u8; 32] =
    hex!("AF2BDBE1AA9B6EC1E2ADE1D694F41FC71A831D0268E9891562113D8A62ADD1BF");

static SCANNING: AtomicBool = AtomicBool::new(false);
static HITS: AtomicUsize = AtomicUsize::new(0);

struct ScanningAllocator;

fn holds_scalar(block: &[u8]) -> bool {
    let mut reversed = SCALAR;
    reversed.reverse();

    block
        .windows(SCALAR.len())
        .any(|w| w == SCALAR || w == reversed)
}

unsafe impl GlobalAlloc for ScanningAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if SCANNING.load(Ordering::SeqCst) {
            let block = unsafe { core::slice::from_raw_parts(ptr, layout.size()) };

            if holds_scalar(block) {
                HITS.fetch_add(1, Ordering::SeqCst);
            }
        }

        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: ScanningAllocator = ScanningAllocator;

#[test]
fn freed_memory_holds_no_private_scalar() {
    let domain = NamedCurve::Secp256r1.domain().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(7);

    let (alg_id, der, expected_public) = {
        let scalar = BigUint::from_bytes_be(&SCALAR);
        let key = EcPrivateKey::from_private_scalar(domain.clone(), &scalar).unwrap();
        let alg_id = key.public_key().algorithm_identifier().unwrap();
        (alg_id, key.to_pkcs8_bytes().unwrap(), key.public_key().clone())
    };
    let peer = EcPrivateKey::generate(domain, &mut rng)
        .unwrap()
        .public_key()
        .clone();

    SCANNING.store(true, Ordering::SeqCst);

    let key = EcPrivateKey::from_encoded(&alg_id, &der).unwrap();
    let shared = ecdh::diffie_hellman(&key, &peer).unwrap();
    let signature = ecdsa::sign_prehash(&key, &mut rng, &DIGEST).unwrap();
    drop(key.private_value());
    let public = key.public_key().clone();
    drop(key);
    drop(der);
    drop(shared);

    SCANNING.store(false, Ordering::SeqCst);

    assert_eq!(HITS.load(Ordering::SeqCst), 0);
    assert_eq!(public, expected_public);
    assert!(ecdsa::verify_prehash(&public, &DIGEST, &signature));
}
