//! Cache behaviour of the backend entities.
//!
//! The wire types live in `motorhub-api-types`; this module teaches the cache
//! how to identify them and how their toggle endpoints change them.

use motorhub_api_types::{Comment, Event, Listing, Post, User, Vehicle};

use crate::cache::{Contains, Identified, Toggle, replace_in, replace_one};

macro_rules! identified_by_id {
    ($($entity:ty),+ $(,)?) => {
        $(
            impl Identified for $entity {
                type Id = i64;

                fn id(&self) -> i64 {
                    self.id
                }
            }

            impl Contains<$entity> for $entity {
                fn replace_matching(
                    &mut self,
                    id: &i64,
                    update: &dyn Fn(&$entity) -> $entity,
                ) -> usize {
                    replace_one(self, id, update)
                }
            }

            impl Contains<$entity> for Vec<$entity> {
                fn replace_matching(
                    &mut self,
                    id: &i64,
                    update: &dyn Fn(&$entity) -> $entity,
                ) -> usize {
                    replace_in(self, id, update)
                }
            }
        )+
    };
}

identified_by_id!(Post, Comment, Event, Listing, Vehicle, User);

/// Flip a flag and move its counter with it.
fn flip(flag: bool, count: u32) -> (bool, u32) {
    if flag {
        (false, count.saturating_sub(1))
    } else {
        (true, count.saturating_add(1))
    }
}

impl Toggle for Post {
    fn toggle_state(&self) -> (bool, u32) {
        (self.upvoted_by_user, self.upvotes_count)
    }

    fn toggled(&self) -> Self {
        let (upvoted_by_user, upvotes_count) = flip(self.upvoted_by_user, self.upvotes_count);
        Self {
            upvoted_by_user,
            upvotes_count,
            ..self.clone()
        }
    }
}

impl Toggle for Comment {
    fn toggle_state(&self) -> (bool, u32) {
        (self.upvoted_by_user, self.upvotes_count)
    }

    fn toggled(&self) -> Self {
        let (upvoted_by_user, upvotes_count) = flip(self.upvoted_by_user, self.upvotes_count);
        Self {
            upvoted_by_user,
            upvotes_count,
            ..self.clone()
        }
    }
}

impl Toggle for Event {
    fn toggle_state(&self) -> (bool, u32) {
        (self.attended_by_user, self.attendance_count)
    }

    fn toggled(&self) -> Self {
        let (attended_by_user, attendance_count) =
            flip(self.attended_by_user, self.attendance_count);
        Self {
            attended_by_user,
            attendance_count,
            ..self.clone()
        }
    }
}
