//! Request/reply API carried inside [`Payload::Api`](pokedrafter_protocol::Payload::Api).
//!
//! A client sends a [`Request`] tagged by `op`; the server answers with a
//! [`Reply`] or an error envelope whose `reply_to` is the request's `seq`.
//!
//! ```json
//! {"op":"submit_pick","draft_id":12,"entry":"Garchomp"}
//! ```

use pokedrafter_draft::{
    Draft, DraftError, DraftStore, DraftTemplate, DraftUpdate, PickError, TemplateSpec,
    TemplateUpdate,
};
use pokedrafter_protocol::{Codec, DraftId, RoomId, TemplateId, UserId};
use pokedrafter_room::{Room, RoomError, RoomSpec, RoomUpdate};
use serde::{Deserialize, Serialize};

use crate::Authenticator;
use crate::server::ServerState;

/// Everything a client can ask for. The acting user is always the one the
/// connection authenticated as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateTemplate {
        template: TemplateSpec,
    },
    GetTemplate {
        template_id: TemplateId,
    },
    ListTemplates,
    UpdateTemplate {
        template_id: TemplateId,
        update: TemplateUpdate,
    },

    CreateRoom {
        room: RoomSpec,
    },
    GetRoom {
        room_id: RoomId,
    },
    ListRooms,
    UpdateRoom {
        room_id: RoomId,
        update: RoomUpdate,
    },
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    SetModerators {
        room_id: RoomId,
        moderators: Vec<UserId>,
    },
    DeleteRoom {
        room_id: RoomId,
    },

    StartDraft {
        room_id: RoomId,
        template_id: TemplateId,
    },
    GetDraft {
        draft_id: DraftId,
    },
    GetRoomDraft {
        room_id: RoomId,
    },
    SubmitPick {
        draft_id: DraftId,
        entry: String,
    },
    UpdateDraft {
        room_id: RoomId,
        update: DraftUpdate,
    },
}

/// Successful answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Reply {
    Template(DraftTemplate),
    Templates(Vec<DraftTemplate>),
    Room(Room),
    Rooms(Vec<Room>),
    RoomDeleted(RoomId),
    Draft(Draft),
}

/// Runs one request for `user`.
///
/// Draft reads and picks go straight to the draft manager; room requests
/// go through the room manager, which checks permissions first.
pub(crate) async fn dispatch<S, A, C>(
    state: &ServerState<S, A, C>,
    user: UserId,
    request: Request,
) -> Result<Reply, RoomError>
where
    S: DraftStore,
    A: Authenticator,
    C: Codec,
{
    let drafts = &state.drafts;
    let rooms = &state.rooms;
    let reply = match request {
        Request::CreateTemplate { template } => {
            Reply::Template(drafts.create_template(user, template).await?)
        }
        Request::GetTemplate { template_id } => {
            Reply::Template(drafts.get_template(template_id).await?)
        }
        Request::ListTemplates => Reply::Templates(drafts.list_templates().await?),
        Request::UpdateTemplate {
            template_id,
            update,
        } => Reply::Template(drafts.update_template(template_id, user, update).await?),

        Request::CreateRoom { room } => Reply::Room(rooms.create_room(user, room).await?),
        Request::GetRoom { room_id } => Reply::Room(rooms.get_room(room_id).await?),
        Request::ListRooms => Reply::Rooms(rooms.list_rooms().await?),
        Request::UpdateRoom { room_id, update } => {
            Reply::Room(rooms.update_room(room_id, user, update).await?)
        }
        Request::JoinRoom { room_id } => Reply::Room(rooms.join_room(user, room_id).await?),
        Request::LeaveRoom { room_id } => Reply::Room(rooms.leave_room(user, room_id).await?),
        Request::SetModerators {
            room_id,
            moderators,
        } => Reply::Room(rooms.set_moderators(room_id, user, moderators).await?),
        Request::DeleteRoom { room_id } => {
            rooms.delete_room(room_id, user).await?;
            Reply::RoomDeleted(room_id)
        }

        Request::StartDraft {
            room_id,
            template_id,
        } => Reply::Draft(rooms.start_draft(room_id, user, template_id).await?),
        Request::GetDraft { draft_id } => Reply::Draft(drafts.get_draft(draft_id).await?),
        Request::GetRoomDraft { room_id } => {
            let draft = drafts
                .draft_for_room(room_id)
                .await?
                .ok_or(RoomError::NoDraft(room_id))?;
            Reply::Draft(draft)
        }
        Request::SubmitPick { draft_id, entry } => {
            Reply::Draft(drafts.submit_pick(draft_id, user, &entry).await?)
        }
        Request::UpdateDraft { room_id, update } => {
            Reply::Draft(rooms.update_draft(room_id, user, update).await?)
        }
    };
    Ok(reply)
}

/// Maps an error to the status code sent in `SystemMessage::Error`.
///
/// Infrastructure failures are `503` whatever their cause; the client may
/// retry, the server never does.
pub fn status_code(err: &RoomError) -> u16 {
    if !err.is_domain() {
        return 503;
    }
    match err {
        RoomError::NotFound(_) | RoomError::NoDraft(_) => 404,
        RoomError::NotModerator(..) | RoomError::NotCreator(..) => 403,
        RoomError::NameTaken(_)
        | RoomError::RoomFull(_)
        | RoomError::AlreadyInRoom(..)
        | RoomError::InvalidState(_) => 409,
        RoomError::InvalidRoom(_) | RoomError::NotInRoom(..) => 400,
        RoomError::Draft(err) => draft_status_code(err),
    }
}

fn draft_status_code(err: &DraftError) -> u16 {
    match err {
        DraftError::NotFound(_) | DraftError::TemplateNotFound(_) => 404,
        DraftError::NotTemplateOwner { .. } => 403,
        DraftError::RoomAlreadyHasDraft { .. }
        | DraftError::TemplateNameTaken(_)
        | DraftError::TemplateInUse(_) => 409,
        DraftError::Pick(pick) => match pick {
            PickError::NotYourTurn { .. } => 403,
            PickError::NotActive(_) | PickError::AlreadyPicked { .. } => 409,
            PickError::UnknownEntry(_)
            | PickError::PointLimitExceeded { .. }
            | PickError::PickLimitExceeded { .. } => 422,
        },
        DraftError::InsufficientParticipants(_)
        | DraftError::DuplicateParticipant(_)
        | DraftError::InvalidTemplate(_)
        | DraftError::InvalidBoard(_)
        | DraftError::InvalidUpdate(_) => 400,
        DraftError::Unavailable(_) | DraftError::Store(_) => 503,
    }
}
