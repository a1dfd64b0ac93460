use crate::geometry::{Approach, LaneRole};
use crate::pool::VehiclePool;
use crate::VehicleId;
use itertools::Itertools;
use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

/// The queue of vehicles in the controlled lane of one approach, front first.
///
/// Vehicles never overtake one another within a lane, so arrival order is also
/// the order of their travel coordinates and the queue never needs sorting.
#[derive(Clone, Debug, Default)]
pub struct LaneQueue {
    vehicles: VecDeque<VehicleId>,
}

/// The controlled-lane queues of all four approaches.
#[derive(Clone, Debug, Default)]
pub struct LaneQueues([LaneQueue; 4]);

impl LaneQueue {
    /// Adds a vehicle to the rear of the queue.
    pub fn enqueue(&mut self, id: VehicleId) {
        self.vehicles.push_back(id);
    }

    /// Removes and returns the vehicle at the front of the queue.
    pub fn dequeue(&mut self) -> Option<VehicleId> {
        self.vehicles.pop_front()
    }

    /// The vehicle at the front of the queue.
    pub fn peek_front(&self) -> Option<VehicleId> {
        self.vehicles.front().copied()
    }

    /// Removes the given vehicle from anywhere in the queue.
    /// Returns `true` iff it was queued.
    pub fn remove(&mut self, id: VehicleId) -> bool {
        match self.vehicles.iter().position(|v| *v == id) {
            Some(idx) => {
                self.vehicles.remove(idx);
                true
            }
            None => false,
        }
    }

    /// The number of queued vehicles.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Returns an iterator over the queued vehicles, front first.
    pub fn iter(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.vehicles.iter().copied()
    }

    /// Checks that every queued vehicle is active in the given lane and that the
    /// queue order matches the order of travel coordinates.
    pub(crate) fn check_order(&self, pool: &VehiclePool, approach: Approach) {
        let positions = self
            .iter()
            .map(|id| match pool.get(id) {
                Some(vehicle) if vehicle.in_lane(approach, LaneRole::Controlled) => vehicle.pos(),
                _ => panic!("queue for {:?} holds a stray vehicle {:?}", approach, id),
            })
            .collect::<Vec<_>>();
        for (front, back) in positions.iter().tuple_windows() {
            assert!(
                front > back,
                "queue for {:?} is out of order: {} before {}",
                approach,
                front,
                back
            );
        }
        assert_eq!(
            self.len(),
            pool.count_in_lane(approach, LaneRole::Controlled),
            "queue for {:?} does not match its lane",
            approach
        );
    }
}

impl LaneQueues {
    /// The number of vehicles queued on an approach.
    pub fn depth(&self, approach: Approach) -> usize {
        self[approach].len()
    }

    /// The mean queue depth over all four approaches.
    pub fn mean_depth(&self) -> f64 {
        let total: usize = self.0.iter().map(LaneQueue::len).sum();
        total as f64 / self.0.len() as f64
    }
}

impl Index<Approach> for LaneQueues {
    type Output = LaneQueue;

    fn index(&self, approach: Approach) -> &LaneQueue {
        &self.0[approach.index()]
    }
}

impl IndexMut<Approach> for LaneQueues {
    fn index_mut(&mut self, approach: Approach) -> &mut LaneQueue {
        &mut self.0[approach.index()]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use slotmap::KeyData;

    fn id(n: u64) -> VehicleId {
        VehicleId::from(KeyData::from_ffi(n | (1 << 32)))
    }

    #[test]
    fn fifo_order() {
        let mut queue = LaneQueue::default();
        queue.enqueue(id(1));
        queue.enqueue(id(2));
        queue.enqueue(id(3));
        assert_eq!(queue.peek_front(), Some(id(1)));
        assert_eq!(queue.dequeue(), Some(id(1)));
        assert_eq!(queue.dequeue(), Some(id(2)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn dequeue_empty() {
        let mut queue = LaneQueue::default();
        assert_eq!(queue.dequeue(), None);
        assert_eq!(queue.peek_front(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn remove_from_middle() {
        let mut queue = LaneQueue::default();
        for n in 1..=3 {
            queue.enqueue(id(n));
        }
        assert!(queue.remove(id(2)));
        assert!(!queue.remove(id(2)));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![id(1), id(3)]);
    }

    #[test]
    fn mean_depth() {
        let mut queues = LaneQueues::default();
        queues[Approach::North].enqueue(id(1));
        queues[Approach::North].enqueue(id(2));
        queues[Approach::West].enqueue(id(3));
        assert_eq!(queues.depth(Approach::North), 2);
        assert_eq!(queues.mean_depth(), 0.75);
    }
}
