use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use epm_auth::{Employee, NewEmployee};
use epm_core::{EmployeeNumber, Entity, ReviewId};
use epm_reviews::{NewReview, Review, ReviewDraft};

use super::{EmployeeStore, ReviewStore, StoreError, StoreResult, UniqueField, sort_for_listing};

#[derive(Debug, Default)]
struct State {
    employees: BTreeMap<EmployeeNumber, Employee>,
    reviews: BTreeMap<ReviewId, Review>,
    last_review_id: i64,
}

/// In-memory employee + review store for tests/dev.
///
/// Both tables live behind one lock, so the review → employee reference is
/// checked and written atomically.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    inner: RwLock<State>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EmployeeStore for InMemoryDatabase {
    async fn find_by_number(&self, number: EmployeeNumber) -> StoreResult<Option<Employee>> {
        Ok(self.read()?.employees.get(&number).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .values()
            .find(|e| e.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn insert(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.write()?;

        if state.employees.contains_key(&employee.employee_number) {
            return Err(StoreError::Duplicate(UniqueField::EmployeeNumber));
        }
        for existing in state.employees.values() {
            if existing.email == employee.email {
                return Err(StoreError::Duplicate(UniqueField::Email));
            }
            if existing.username == employee.username {
                return Err(StoreError::Duplicate(UniqueField::Username));
            }
        }

        let employee = employee.into_employee();
        state.employees.insert(*employee.id(), employee.clone());
        Ok(employee)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.read()?.employees.len() as u64)
    }
}

#[async_trait]
impl ReviewStore for InMemoryDatabase {
    async fn create(&self, review: NewReview) -> StoreResult<Review> {
        let mut state = self.write()?;

        if !state.employees.contains_key(&review.employee_number) {
            return Err(StoreError::UnknownEmployee(review.employee_number));
        }

        state.last_review_id += 1;
        let review = review.into_review(ReviewId::new(state.last_review_id));
        state.reviews.insert(*review.id(), review.clone());
        Ok(review)
    }

    async fn get_by_id(&self, id: ReviewId) -> StoreResult<Option<Review>> {
        Ok(self.read()?.reviews.get(&id).cloned())
    }

    async fn list_for_employee(&self, employee: EmployeeNumber) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .read()?
            .reviews
            .values()
            .filter(|r| r.employee_number == employee)
            .cloned()
            .collect();
        sort_for_listing(&mut reviews);
        Ok(reviews)
    }

    async fn list_all(&self) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self.read()?.reviews.values().cloned().collect();
        sort_for_listing(&mut reviews);
        Ok(reviews)
    }

    async fn update(&self, id: ReviewId, draft: ReviewDraft) -> StoreResult<Option<Review>> {
        let mut state = self.write()?;
        Ok(state.reviews.get_mut(&id).map(|review| {
            review.apply(draft);
            review.clone()
        }))
    }

    async fn delete(&self, id: ReviewId) -> StoreResult<bool> {
        Ok(self.write()?.reviews.remove(&id).is_some())
    }
}
