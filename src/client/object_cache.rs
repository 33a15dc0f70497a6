//! Normalized client-side cache of catalog objects.
//!
//! Albums are stored once by id; the listing, the liked collection and the
//! profile only reference them. An optimistic write keeps the last
//! server-confirmed value next to it so that a failure can roll back without
//! consulting anything else.

use crate::catalog_store::{Album, AlbumFilter, AlbumId};
use crate::user::{UserId, UserProfile};
use std::collections::HashMap;

pub type MutationId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEntry<T> {
    Confirmed(T),
    Optimistic {
        value: T,
        /// Last server-confirmed value, None if the object was never confirmed.
        rollback_to: Option<T>,
        mutation: MutationId,
    },
}

impl<T> CacheEntry<T> {
    pub fn value(&self) -> &T {
        match self {
            CacheEntry::Confirmed(value) => value,
            CacheEntry::Optimistic { value, .. } => value,
        }
    }

    pub fn confirmed(&self) -> Option<&T> {
        match self {
            CacheEntry::Confirmed(value) => Some(value),
            CacheEntry::Optimistic { rollback_to, .. } => rollback_to.as_ref(),
        }
    }

    pub fn is_optimistic(&self) -> bool {
        matches!(self, CacheEntry::Optimistic { .. })
    }

    pub fn pending_mutation(&self) -> Option<MutationId> {
        match self {
            CacheEntry::Confirmed(_) => None,
            CacheEntry::Optimistic { mutation, .. } => Some(*mutation),
        }
    }

    /// Drops the optimistic value, returning to the last confirmed one.
    pub fn rollback(self) -> Option<CacheEntry<T>> {
        match self {
            CacheEntry::Confirmed(value) => Some(CacheEntry::Confirmed(value)),
            CacheEntry::Optimistic { rollback_to, .. } => rollback_to.map(CacheEntry::Confirmed),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub filter: AlbumFilter,
    pub ids: Vec<AlbumId>,
}

#[derive(Debug, Default)]
pub struct ObjectCache {
    albums: HashMap<AlbumId, CacheEntry<Album>>,
    listing: Option<Listing>,
    me: Option<UserProfile>,
    /// None until the liked collection has been loaded once.
    liked: Option<Vec<AlbumId>>,
    scope: Option<UserId>,
}

impl ObjectCache {
    pub fn new(scope: Option<UserId>) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }

    /// The identity the cached like state belongs to.
    pub fn scope(&self) -> Option<UserId> {
        self.scope
    }

    pub fn set_scope(&mut self, scope: Option<UserId>) {
        self.scope = scope;
    }

    pub fn album(&self, id: AlbumId) -> Option<&Album> {
        self.albums.get(&id).map(CacheEntry::value)
    }

    pub fn entry(&self, id: AlbumId) -> Option<&CacheEntry<Album>> {
        self.albums.get(&id)
    }

    pub fn album_ids(&self) -> Vec<AlbumId> {
        self.albums.keys().copied().collect()
    }

    pub fn listing(&self) -> Option<&Listing> {
        self.listing.as_ref()
    }

    pub fn listing_albums(&self) -> Vec<Album> {
        self.resolve(self.listing.as_ref().map(|l| l.ids.as_slice()))
    }

    pub fn liked_albums(&self) -> Vec<Album> {
        self.resolve(self.liked.as_deref())
    }

    pub fn me(&self) -> Option<&UserProfile> {
        self.me.as_ref()
    }

    fn resolve(&self, ids: Option<&[AlbumId]>) -> Vec<Album> {
        ids.unwrap_or_default()
            .iter()
            .filter_map(|id| self.album(*id).cloned())
            .collect()
    }

    pub fn apply_optimistic(&mut self, value: Album, mutation: MutationId) {
        let rollback_to = self
            .albums
            .get(&value.id)
            .and_then(|entry| entry.confirmed().cloned());
        self.albums.insert(
            value.id,
            CacheEntry::Optimistic {
                value,
                rollback_to,
                mutation,
            },
        );
    }

    /// Applies the server response of `mutation`. If a newer mutation is
    /// still pending the response only becomes its rollback target.
    pub fn confirm(&mut self, album: Album, mutation: MutationId) {
        if let Some(CacheEntry::Optimistic {
            rollback_to,
            mutation: pending,
            ..
        }) = self.albums.get_mut(&album.id)
        {
            if *pending != mutation {
                *rollback_to = Some(album);
                return;
            }
        }
        self.update_liked_membership(&album);
        self.albums.insert(album.id, CacheEntry::Confirmed(album));
    }

    /// Rolls back the optimistic write of `mutation`. Returns false if the
    /// entry is no longer governed by that mutation.
    pub fn fail(&mut self, id: AlbumId, mutation: MutationId) -> bool {
        let Some(entry) = self.albums.remove(&id) else {
            return false;
        };
        if entry.pending_mutation() != Some(mutation) {
            self.albums.insert(id, entry);
            return false;
        }
        if let Some(restored) = entry.rollback() {
            self.albums.insert(id, restored);
        }
        true
    }

    /// Merges an album read from the server.
    pub fn merge_album(&mut self, album: Album) {
        if let Some(CacheEntry::Optimistic { rollback_to, .. }) = self.albums.get_mut(&album.id) {
            *rollback_to = Some(album);
            return;
        }
        self.albums.insert(album.id, CacheEntry::Confirmed(album));
    }

    pub fn set_listing(&mut self, filter: AlbumFilter, albums: Vec<Album>) {
        let ids = albums.iter().map(|a| a.id).collect();
        for album in albums {
            self.merge_album(album);
        }
        self.listing = Some(Listing { filter, ids });
    }

    pub fn clear_listing(&mut self) {
        self.listing = None;
    }

    /// Full replacement of the liked collection.
    pub fn set_liked(&mut self, albums: Vec<Album>) {
        let ids = albums.iter().map(|a| a.id).collect();
        for album in albums {
            self.merge_album(album);
        }
        self.liked = Some(ids);
    }

    /// Latest profile wins, and it carries the authoritative liked collection.
    pub fn set_me(&mut self, me: Option<UserProfile>) {
        match &me {
            Some(profile) => self.set_liked(profile.liked_albums.clone()),
            None => self.liked = None,
        }
        self.me = me;
    }

    /// Every album reads as not liked, pending writes included.
    pub fn force_unliked(&mut self) {
        for entry in self.albums.values_mut() {
            let album = entry.value().clone().with_liked(false);
            *entry = CacheEntry::Confirmed(album);
        }
        self.liked = None;
        self.me = None;
    }

    fn update_liked_membership(&mut self, album: &Album) {
        let Some(liked) = self.liked.as_mut() else {
            return;
        };
        liked.retain(|id| *id != album.id);
        if album.is_liked {
            liked.push(album.id);
        }
        let albums = &self.albums;
        let title_of = |id: &AlbumId| -> String {
            if *id == album.id {
                return album.title.clone();
            }
            albums
                .get(id)
                .map(|e| e.value().title.clone())
                .unwrap_or_default()
        };
        liked.sort_by_key(title_of);
    }
}
