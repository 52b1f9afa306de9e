//! Deque

#![no_main]

use chunked_deque::collection::ChunkedDeque;

libfuzzer_sys::fuzz_target!(|data: (u8, u8, u8, u8, u16)| {
  let (a, b, c, d, idx) = data;
  let mut deque = ChunkedDeque::<u8, 3>::new();
  for elem in 0..a.min(32) {
    let _rslt = deque.push_back(elem);
  }
  for elem in 0..b.min(32) {
    let _rslt = deque.push_front(elem);
  }
  for elem in 0..c.min(8) {
    let _rslt = deque.insert(usize::from(idx), elem);
    let _rslt = deque.erase(usize::from(idx).wrapping_add(usize::from(elem)));
  }
  for _ in 0..d.min(64) {
    let _elem = deque.pop_back();
    let _elem = deque.pop_front();
  }
  let len = deque.len();
  assert_eq!(deque.iter().count(), len);
  assert_eq!(deque.end().offset_from(deque.begin()).unsigned_abs(), len);
});
