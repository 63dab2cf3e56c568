//! 비가역 식별자용 DJB2 해시.
//!
//! 클라이언트 식별자와 접속 IP의 가명화(pseudonymization)에 사용한다.
//! 암호학적 해시가 아니므로 인증 용도로 쓰면 안 된다 — 입력 공간이
//! 작으면 브루트포스로 역산 가능하다.

/// DJB2 해시 (xor 변형)를 적용해 소문자 16진수 문자열로 반환
pub fn djb2_hash(input: &str) -> String {
    let mut hash: u32 = 5381;
    for byte in input.bytes() {
        hash = hash.wrapping_shl(5).wrapping_add(hash) ^ u32::from(byte);
    }
    format!("{hash:x}")
}
