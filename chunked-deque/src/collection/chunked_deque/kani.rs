use crate::collection::ChunkedDeque;
use alloc::collections::VecDeque;

#[kani::proof]
#[kani::unwind(12)]
fn deque() {
  let bytes = kani::vec::any_vec::<u8, 8>();
  let mut deque = ChunkedDeque::<u8, 2>::new();
  let mut vec_deque = VecDeque::new();

  for byte in bytes.iter().copied() {
    if byte % 2 == 0 {
      deque.push_front(byte).unwrap();
      vec_deque.push_front(byte);
    } else {
      deque.push_back(byte).unwrap();
      vec_deque.push_back(byte);
    }
  }
  assert_eq!(deque.len(), vec_deque.len());
  assert_eq!(deque.end().offset_from(deque.begin()), isize::try_from(deque.len()).unwrap());
  loop {
    if deque.is_empty() {
      break;
    }
    assert_eq!(deque.front(), vec_deque.front());
    assert_eq!(deque.pop_back(), vec_deque.pop_back());
    if deque.is_empty() {
      break;
    }
    assert_eq!(deque.back(), vec_deque.back());
    assert_eq!(deque.pop_front(), vec_deque.pop_front());
  }
  assert_eq!((deque.len(), vec_deque.len()), (0, 0));
  assert_eq!(deque.chunks_len(), 0);
}
