/*
 * dkimoracle signing daemon
 *
 * Copyright (c) the dkimoracle authors
 * Licensed under the Apache License, Version 2.0
 *
 * You should have received a copy of the Apache License, Version 2.0 along
 * with this program. If not, see https://www.apache.org/licenses/LICENSE-2.0.
 *
 */

//! End-to-end scenarios (spec §8 S1-S6), each driving a fresh instance of
//! the daemon over a loopback TCP socket, mirroring how a test client would
//! talk to a running `dkimoracled`.

use std::net::SocketAddr;
use std::sync::Arc;

use base64::Engine as _;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use dkimoracle_daemon::connection::{serve, Shared};
use dkimoracle_keys::{KeySource, KeyStore, Record};
use dkimoracle_resolver::{TagEntry, TagMap};

const TEST_KEY_PEM: &str = include_str!("../../keys/testdata/test-1024.pem");
const TEST_KEY_PEM_B: &str = include_str!("../../keys/testdata/test-1024-b.pem");
const TEST_PUB_PEM: &str = include_str!("../../keys/testdata/test-1024.pub.pem");

/// Bind a fresh loopback listener, accept connections in the background and
/// hand each off to [`serve`], and return the address clients should dial.
/// Dropping the returned `JoinHandle`-less task is fine: the listener task
/// outlives the test process and is reclaimed when the runtime shuts down.
async fn spawn_server(shared: Shared) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shared = Arc::new(shared);

    tokio::spawn(async move {
        loop {
            let (stream, _peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            tokio::spawn(serve(stream, Arc::clone(&shared)));
        }
    });

    addr
}

async fn send_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut reader = BufReader::new(&mut stream);
    let mut collected = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before a terminating blank line");
        collected.extend_from_slice(&buf[..n]);
        if collected.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8(collected).unwrap()
}

fn attribute<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response
        .lines()
        .find_map(|line| line.strip_prefix(&format!("{name}=")))
}

fn store_with_one_key() -> KeyStore {
    let mut store = KeyStore::new();
    store
        .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
        .unwrap();
    store.postprocess();
    store
}

/// S1 - basic choose+sign: one key, `choose_key` for an author matching its
/// domain returns the declared tags plus the built-in catchall.
#[tokio::test]
async fn s1_basic_choose_key() {
    let shared = Shared {
        store: store_with_one_key(),
        tagmaps: Vec::new(),
    };
    let addr = spawn_server(shared).await;

    let response = send_request(
        addr,
        "request=choose_key\r\ncandidate=author u@example.org\r\n\r\n",
    )
    .await;

    assert_eq!(attribute(&response, "sig.d"), Some("example.org"));
    assert_eq!(attribute(&response, "sig.s"), Some("sel1"));
    assert_eq!(attribute(&response, "sig.a"), Some("rsa-sha256"));
    assert_eq!(attribute(&response, "sig.c"), Some("relaxed/simple"));
    assert_eq!(attribute(&response, "chosen_candidate"), Some("author u@example.org"));
}

/// S2 - sign round-trip: the returned signature verifies against the
/// matching public key under RSASSA-PKCS1-v1_5 with SHA-256.
#[tokio::test]
async fn s2_sign_round_trip_verifies() {
    use rsa::pkcs8::DecodePublicKey as _;
    use sha2::Digest as _;

    let shared = Shared {
        store: store_with_one_key(),
        tagmaps: Vec::new(),
    };
    let addr = spawn_server(shared).await;

    let digest = sha2::Sha256::digest(b"hello\n");
    let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);
    let request = format!(
        "request=sign\r\nd=example.org\r\ns=sel1\r\ndigest_alg=sha256\r\ndigest={digest_b64}\r\n\r\n"
    );

    let response = send_request(addr, &request).await;

    assert_eq!(attribute(&response, "d"), Some("example.org"));
    assert_eq!(attribute(&response, "s"), Some("sel1"));
    let signature_b64 = attribute(&response, "b").expect("response carries a signature");
    let signature = base64::engine::general_purpose::STANDARD.decode(signature_b64).unwrap();
    assert_eq!(signature.len(), 128);

    let public_key = rsa::RsaPublicKey::from_public_key_pem(TEST_PUB_PEM).unwrap();
    rsa::Pkcs1v15Sign::new::<sha2::Sha256>()
        .verify(&public_key, &digest, &signature)
        .unwrap();
}

/// S3 - selector constraint: with no sender tag-maps configured, the
/// request's `sig.a` hint alone decides which same-domain key is chosen.
#[tokio::test]
async fn s3_selector_constraint_by_hash_algorithm() {
    use dkimoracle_keys::HashAlgorithm;

    let mut store = KeyStore::new();
    let mut rec_sha1 = Record::default();
    rec_sha1.acceptable_hashes = vec![HashAlgorithm::Sha1];
    store
        .declare_key("example.org", "sel1", KeySource::Inline(TEST_KEY_PEM), rec_sha1)
        .unwrap();
    let mut rec_sha256 = Record::default();
    rec_sha256.acceptable_hashes = vec![HashAlgorithm::Sha256];
    store
        .declare_key("example.org", "sel2", KeySource::Inline(TEST_KEY_PEM_B), rec_sha256)
        .unwrap();
    store.postprocess();

    let addr = spawn_server(Shared {
        store,
        tagmaps: Vec::new(),
    })
    .await;

    let response = send_request(
        addr,
        "request=choose_key\r\nsig.a=rsa-sha256\r\ncandidate=author u@example.org\r\n\r\n",
    )
    .await;
    assert_eq!(attribute(&response, "sig.s"), Some("sel2"));

    let response = send_request(
        addr,
        "request=choose_key\r\nsig.a=rsa-sha1\r\ncandidate=author u@example.org\r\n\r\n",
    )
    .await;
    assert_eq!(attribute(&response, "sig.s"), Some("sel1"));
}

/// S4 - subdomain rewrite: a tag-map keyed on the parent-suffix form
/// rewrites `d` to the parent domain for a subdomain candidate.
#[tokio::test]
async fn s4_subdomain_tag_map_rewrites_d() {
    let mut store = KeyStore::new();
    store
        .declare_key("example.com", "sel1", KeySource::Inline(TEST_KEY_PEM), Record::default())
        .unwrap();
    store.postprocess();

    let mut tagmap = TagMap::new();
    tagmap.insert(".example.com".to_owned(), TagEntry::new().with_tag("d", "example.com"));

    let addr = spawn_server(Shared {
        store,
        tagmaps: vec![tagmap],
    })
    .await;

    let response = send_request(
        addr,
        "request=choose_key\r\ncandidate=author bob@mail.example.com\r\n\r\n",
    )
    .await;

    assert_eq!(attribute(&response, "sig.d"), Some("example.com"));
    assert_eq!(attribute(&response, "sig.s"), Some("sel1"));
}

/// S5 - no key available: an unmatched candidate yields no `sig.s`/
/// `chosen_candidate`, and a subsequent `sign` for the same domain reports
/// the fixed "signing key not available" reason with no `b`.
#[tokio::test]
async fn s5_no_key_available() {
    let addr = spawn_server(Shared {
        store: store_with_one_key(),
        tagmaps: Vec::new(),
    })
    .await;

    let response = send_request(
        addr,
        "request=choose_key\r\ncandidate=author x@unknown.test\r\n\r\n",
    )
    .await;
    assert!(attribute(&response, "sig.s").is_none());
    assert!(attribute(&response, "chosen_candidate").is_none());

    let response = send_request(
        addr,
        "request=sign\r\nd=unknown.test\r\ns=anything\r\ndigest_alg=sha256\r\ndigest=aGVsbG8=\r\n\r\n",
    )
    .await;
    assert_eq!(
        attribute(&response, "reason"),
        Some("cannot sign, signing key not available")
    );
    assert!(attribute(&response, "b").is_none());
}

/// S6 - pipelined requests: two `choose_key` requests sent back to back on
/// one connection arrive in order, each terminated by its own blank line.
#[tokio::test]
async fn s6_pipelined_requests_arrive_in_order() {
    let shared = Arc::new(Shared {
        store: store_with_one_key(),
        tagmaps: Vec::new(),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _peer) = listener.accept().await.unwrap();
        serve(stream, shared).await;
    });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"request=choose_key\r\ncandidate=author alice@example.org\r\n\r\n\
              request=choose_key\r\ncandidate=author bob@example.org\r\n\r\n",
        )
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let mut collected = Vec::new();
    stream.read_to_end(&mut collected).await.unwrap();
    let text = String::from_utf8(collected).unwrap();

    let first = text.find("chosen_candidate=author alice@example.org").unwrap();
    let second = text.find("chosen_candidate=author bob@example.org").unwrap();
    assert!(first < second, "responses must arrive in request order");
    assert_eq!(text.matches("\r\n\r\n").count(), 2);
}
