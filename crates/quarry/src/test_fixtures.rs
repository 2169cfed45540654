//! Fixture entities shared across the crate's tests: a small music
//! catalog exercising every schema feature — generated keys, composite
//! keys, two relations against one table, soft-delete, update stamps,
//! and insert-only columns.

use crate::{
    schema::{EntityDeclaration, FieldDecl, RelationTarget, SchemaError},
    traits::{Entity, Record},
    value::Value,
};
use std::any::Any;
use time::OffsetDateTime;
use uuid::Uuid;

fn wrong_shape(entity: &str, field: &str, expected: &'static str) -> SchemaError {
    SchemaError::FieldType {
        entity: entity.to_string(),
        field: field.to_string(),
        expected,
    }
}

fn unknown_relation(entity: &str, relation: &str) -> SchemaError {
    SchemaError::UnknownRelation {
        entity: entity.to_string(),
        relation: relation.to_string(),
    }
}

fn downcast<E: Entity>(
    entity: &str,
    relation: &str,
    child: Box<dyn Record>,
) -> Result<E, SchemaError> {
    child
        .into_any()
        .downcast::<E>()
        .map(|boxed| *boxed)
        .map_err(|_| SchemaError::RelationType {
            entity: entity.to_string(),
            relation: relation.to_string(),
        })
}

///
/// Artist
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub albums: Vec<Album>,
}

impl Record for Artist {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Uuid(self.id)),
            "name" => Some(Value::Text(self.name.clone())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaError> {
        match (field, value) {
            ("id", Value::Uuid(v)) => self.id = v,
            ("name", Value::Text(v)) => self.name = v,
            ("id", _) => return Err(wrong_shape("Artist", field, "uuid")),
            (_, _) => return Err(wrong_shape("Artist", field, "text")),
        }

        Ok(())
    }

    fn to_one(&self, _relation: &str) -> Option<&dyn Record> {
        None
    }

    fn to_one_mut(&mut self, _relation: &str) -> Option<&mut dyn Record> {
        None
    }

    fn to_many(&self, relation: &str) -> Vec<&dyn Record> {
        match relation {
            "albums" => self.albums.iter().map(|a| a as &dyn Record).collect(),
            _ => Vec::new(),
        }
    }

    fn to_many_mut(&mut self, relation: &str) -> Vec<&mut dyn Record> {
        match relation {
            "albums" => self
                .albums
                .iter_mut()
                .map(|a| a as &mut dyn Record)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn attach(&mut self, relation: &str, child: Box<dyn Record>) -> Result<(), SchemaError> {
        match relation {
            "albums" => {
                self.albums.push(downcast("Artist", relation, child)?);
                Ok(())
            }
            _ => Err(unknown_relation("Artist", relation)),
        }
    }
}

impl Entity for Artist {
    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new("Artist", "artist")
            .field(FieldDecl::new("id").key().auto_value())
            .field(FieldDecl::new("name"))
            .to_many("albums", RelationTarget::of::<Album>(), "artist_id")
    }
}

///
/// Album
///

#[derive(Clone, Debug, PartialEq)]
pub struct Album {
    pub id: Uuid,
    pub title: String,
    pub plays: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted: bool,
    pub artist: Option<Box<Artist>>,
    pub co_artist: Option<Box<Artist>>,
    pub tracks: Vec<Track>,
}

impl Default for Album {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            title: String::new(),
            plays: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            deleted: false,
            artist: None,
            co_artist: None,
            tracks: Vec::new(),
        }
    }
}

impl Record for Album {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Uuid(self.id)),
            "title" => Some(Value::Text(self.title.clone())),
            "plays" => Some(Value::Int(self.plays)),
            "created_at" => Some(Value::Timestamp(self.created_at)),
            "updated_at" => Some(Value::Timestamp(self.updated_at)),
            "deleted" => Some(Value::Bool(self.deleted)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaError> {
        match (field, value) {
            ("id", Value::Uuid(v)) => self.id = v,
            ("title", Value::Text(v)) => self.title = v,
            ("plays", Value::Int(v)) => self.plays = v,
            ("created_at", Value::Timestamp(v)) => self.created_at = v,
            ("updated_at", Value::Timestamp(v)) => self.updated_at = v,
            ("deleted", Value::Bool(v)) => self.deleted = v,
            (field, _) => return Err(wrong_shape("Album", field, "declared shape")),
        }

        Ok(())
    }

    fn to_one(&self, relation: &str) -> Option<&dyn Record> {
        match relation {
            "artist" => self.artist.as_deref().map(|a| a as &dyn Record),
            "co_artist" => self.co_artist.as_deref().map(|a| a as &dyn Record),
            _ => None,
        }
    }

    fn to_one_mut(&mut self, relation: &str) -> Option<&mut dyn Record> {
        match relation {
            "artist" => self.artist.as_deref_mut().map(|a| a as &mut dyn Record),
            "co_artist" => self.co_artist.as_deref_mut().map(|a| a as &mut dyn Record),
            _ => None,
        }
    }

    fn to_many(&self, relation: &str) -> Vec<&dyn Record> {
        match relation {
            "tracks" => self.tracks.iter().map(|t| t as &dyn Record).collect(),
            _ => Vec::new(),
        }
    }

    fn to_many_mut(&mut self, relation: &str) -> Vec<&mut dyn Record> {
        match relation {
            "tracks" => self
                .tracks
                .iter_mut()
                .map(|t| t as &mut dyn Record)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn attach(&mut self, relation: &str, child: Box<dyn Record>) -> Result<(), SchemaError> {
        match relation {
            "artist" => {
                self.artist = Some(Box::new(downcast("Album", relation, child)?));
                Ok(())
            }
            "co_artist" => {
                self.co_artist = Some(Box::new(downcast("Album", relation, child)?));
                Ok(())
            }
            "tracks" => {
                self.tracks.push(downcast("Album", relation, child)?);
                Ok(())
            }
            _ => Err(unknown_relation("Album", relation)),
        }
    }
}

impl Entity for Album {
    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new("Album", "album")
            .field(FieldDecl::new("id").key().auto_value())
            .field(FieldDecl::new("title"))
            .field(FieldDecl::new("plays"))
            .field(FieldDecl::new("created_at").ignore_on_update())
            .field(FieldDecl::new("updated_at").updated_at())
            .field(FieldDecl::new("deleted").soft_delete())
            .to_one("artist", RelationTarget::of::<Artist>(), "artist_id")
            .to_one("co_artist", RelationTarget::of::<Artist>(), "co_artist_id")
            .to_many("tracks", RelationTarget::of::<Track>(), "album_id")
    }
}

///
/// Track
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub duration: i64,
}

impl Record for Track {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Uuid(self.id)),
            "title" => Some(Value::Text(self.title.clone())),
            "duration" => Some(Value::Int(self.duration)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaError> {
        match (field, value) {
            ("id", Value::Uuid(v)) => self.id = v,
            ("title", Value::Text(v)) => self.title = v,
            ("duration", Value::Int(v)) => self.duration = v,
            (field, _) => return Err(wrong_shape("Track", field, "declared shape")),
        }

        Ok(())
    }

    fn to_one(&self, _relation: &str) -> Option<&dyn Record> {
        None
    }

    fn to_one_mut(&mut self, _relation: &str) -> Option<&mut dyn Record> {
        None
    }

    fn to_many(&self, _relation: &str) -> Vec<&dyn Record> {
        Vec::new()
    }

    fn to_many_mut(&mut self, _relation: &str) -> Vec<&mut dyn Record> {
        Vec::new()
    }

    fn attach(&mut self, relation: &str, _child: Box<dyn Record>) -> Result<(), SchemaError> {
        Err(unknown_relation("Track", relation))
    }
}

impl Entity for Track {
    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new("Track", "track")
            .field(FieldDecl::new("id").key().auto_value())
            .field(FieldDecl::new("title"))
            .field(FieldDecl::new("duration"))
    }
}

///
/// Rating
///
/// Composite two-column key, no generated values.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rating {
    pub user_id: i64,
    pub track_id: i64,
    pub stars: i64,
}

impl Record for Rating {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "user_id" => Some(Value::Int(self.user_id)),
            "track_id" => Some(Value::Int(self.track_id)),
            "stars" => Some(Value::Int(self.stars)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaError> {
        match (field, value) {
            ("user_id", Value::Int(v)) => self.user_id = v,
            ("track_id", Value::Int(v)) => self.track_id = v,
            ("stars", Value::Int(v)) => self.stars = v,
            (field, _) => return Err(wrong_shape("Rating", field, "int")),
        }

        Ok(())
    }

    fn to_one(&self, _relation: &str) -> Option<&dyn Record> {
        None
    }

    fn to_one_mut(&mut self, _relation: &str) -> Option<&mut dyn Record> {
        None
    }

    fn to_many(&self, _relation: &str) -> Vec<&dyn Record> {
        Vec::new()
    }

    fn to_many_mut(&mut self, _relation: &str) -> Vec<&mut dyn Record> {
        Vec::new()
    }

    fn attach(&mut self, relation: &str, _child: Box<dyn Record>) -> Result<(), SchemaError> {
        Err(unknown_relation("Rating", relation))
    }
}

impl Entity for Rating {
    fn declaration() -> EntityDeclaration {
        EntityDeclaration::new("Rating", "rating")
            .field(FieldDecl::new("user_id").key())
            .field(FieldDecl::new("track_id").key())
            .field(FieldDecl::new("stars"))
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompositeKey, SchemaRegistry};

    #[test]
    fn new_detection_covers_both_key_arities() {
        let registry = SchemaRegistry::new();

        let track_schema = registry.schema::<Track>().unwrap();
        let track = Track::default();
        assert!(CompositeKey::of(&track, &track_schema).unwrap().is_zero());

        let stored = Track {
            id: Uuid::new_v4(),
            ..Track::default()
        };
        assert!(!CompositeKey::of(&stored, &track_schema).unwrap().is_zero());

        let rating_schema = registry.schema::<Rating>().unwrap();
        assert!(
            CompositeKey::of(&Rating::default(), &rating_schema)
                .unwrap()
                .is_zero()
        );

        let half = Rating {
            user_id: 7,
            ..Rating::default()
        };
        assert!(
            !CompositeKey::of(&half, &rating_schema).unwrap().is_zero(),
            "one non-zero component makes the key non-zero",
        );
    }

    #[test]
    fn composite_key_renders_in_declaration_order() {
        let registry = SchemaRegistry::new();
        let schema = registry.schema::<Rating>().unwrap();
        let rating = Rating {
            user_id: 7,
            track_id: 9,
            stars: 5,
        };

        let key = CompositeKey::of(&rating, &schema).unwrap();
        assert_eq!(key.render(), "user_id=7;track_id=9;");
    }

    #[test]
    fn attach_rejects_the_wrong_child_type() {
        let mut album = Album::default();
        let err = album
            .attach("tracks", Box::new(Artist::default()))
            .unwrap_err();

        assert!(matches!(err, SchemaError::RelationType { relation, .. } if relation == "tracks"));
    }
}
