// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Channel values.
//!
//! A mutex-guarded queue with a condvar for blocking receives. Send is
//! always non-blocking (TrySend): an unbuffered channel accepts a value only
//! while a receiver is parked on it, a buffered one only while below
//! capacity.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::gotype::GoType;
use crate::value::Value;

pub struct Channel {
    pub elem: GoType,
    pub cap: usize,
    state: Mutex<ChanState>,
    recv_ready: Condvar,
}

struct ChanState {
    queue: VecDeque<Value>,
    closed: bool,
    /// Number of receivers currently blocked in recv().
    waiting: usize,
}

impl Channel {
    pub fn new(elem: GoType, cap: usize) -> Self {
        Self {
            elem,
            cap,
            state: Mutex::new(ChanState {
                queue: VecDeque::new(),
                closed: false,
                waiting: 0,
            }),
            recv_ready: Condvar::new(),
        }
    }

    /// Non-blocking send. Returns false when the channel is full, closed,
    /// or unbuffered with no receiver parked.
    pub fn try_send(&self, v: Value) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return false;
        }
        let room = if self.cap == 0 {
            state.waiting > state.queue.len()
        } else {
            state.queue.len() < self.cap
        };
        if !room {
            return false;
        }
        state.queue.push_back(v);
        self.recv_ready.notify_one();
        true
    }

    /// Non-blocking receive; None when nothing is queued.
    pub fn try_recv(&self) -> Option<Value> {
        let mut state = self.state.lock().unwrap();
        state.queue.pop_front()
    }

    /// Blocking receive. Err(()) once the channel is closed and drained.
    pub fn recv(&self) -> Result<Value, ()> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(v) = state.queue.pop_front() {
                return Ok(v);
            }
            if state.closed {
                return Err(());
            }
            state.waiting += 1;
            state = self.recv_ready.wait(state).unwrap();
            state.waiting -= 1;
        }
    }

    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.recv_ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_send_recv() {
        let ch = Channel::new(GoType::Int, 2);
        assert!(ch.try_send(Value::Int(1)));
        assert!(ch.try_send(Value::Int(2)));
        assert!(!ch.try_send(Value::Int(3)), "buffer is full");
        assert!(matches!(ch.try_recv(), Some(Value::Int(1))));
        assert!(matches!(ch.try_recv(), Some(Value::Int(2))));
        assert!(ch.try_recv().is_none());
    }

    #[test]
    fn unbuffered_send_fails_without_receiver() {
        let ch = Channel::new(GoType::Int, 0);
        assert!(!ch.try_send(Value::Int(1)));
    }

    #[test]
    fn recv_on_closed_drained_channel_errors() {
        let ch = Channel::new(GoType::Int, 1);
        assert!(ch.try_send(Value::Int(7)));
        ch.close();
        assert!(matches!(ch.recv(), Ok(Value::Int(7))));
        assert!(ch.recv().is_err());
    }

    #[test]
    fn blocking_recv_wakes_on_send() {
        use std::sync::Arc;
        let ch = Arc::new(Channel::new(GoType::Int, 1));
        let ch2 = ch.clone();
        let handle = std::thread::spawn(move || ch2.recv());
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(ch.try_send(Value::Int(42)));
        assert!(matches!(handle.join().unwrap(), Ok(Value::Int(42))));
    }
}
