//! Event router: binds inbound connection events to session transitions
//! and rebroadcasts the resulting state.
//!
//! Broadcast scopes follow the event table: `create_game` answers the
//! creator alone, `join_game` answers the joiner and notifies the room,
//! everything else that changes state rebroadcasts the full snapshot to
//! the whole room. Guard violations and unknown codes on in-game events
//! are silent; only `join_game` reports an unknown code back, and only to
//! the requester.

use std::sync::Arc;

use quiz_session::events::{
    AnswerRevealed, CreateGame, Envelope, GameJoined, GameRef, PlayerJoined, RevealAnswer,
    ANSWER_REVEALED, CREATE_GAME, GAME_CREATED, GAME_OVER, GAME_STARTED, JOINED_GAME, JOIN_GAME,
    NEXT_QUESTION, PLAYER_JOINED, QUESTION_LOADED, RESTART_GAME, REVEAL_ANSWER, START_GAME,
};
use quiz_session::{
    load_next_question, GameCode, GameSettings, PlayerId, QuestionProvider, SessionRegistry,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::connection::{ConnectionId, ConnectionManager};
use crate::error::ServerError;
use crate::messaging::{encode, encode_error};

/// Routes inbound client events into the session core and broadcasts the
/// results. One router serves every room in the process.
pub struct GameRouter {
    registry: Arc<SessionRegistry>,
    connections: Arc<ConnectionManager>,
    provider: Arc<dyn QuestionProvider>,
}

impl GameRouter {
    pub fn new(
        registry: Arc<SessionRegistry>,
        connections: Arc<ConnectionManager>,
        provider: Arc<dyn QuestionProvider>,
    ) -> Self {
        Self {
            registry,
            connections,
            provider,
        }
    }

    /// Parses one inbound frame and dispatches it.
    ///
    /// An `Err` means the frame itself was unusable (bad JSON, unknown
    /// event, malformed payload); the connection handler replies with an
    /// `error` event. Domain-level failures are handled inside the
    /// individual handlers and always return `Ok`.
    pub async fn route(&self, connection_id: ConnectionId, text: &str) -> Result<(), ServerError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| ServerError::Network(format!("Invalid JSON: {e}")))?;

        match envelope.event.as_str() {
            CREATE_GAME => self.handle_create(connection_id, envelope.data).await,
            JOIN_GAME => self.handle_join(connection_id, envelope.data).await,
            START_GAME => self.handle_start(connection_id, envelope.data, false).await,
            RESTART_GAME => self.handle_start(connection_id, envelope.data, true).await,
            REVEAL_ANSWER => self.handle_reveal(connection_id, envelope.data).await,
            NEXT_QUESTION => self.handle_advance(connection_id, envelope.data).await,
            other => Err(ServerError::Network(format!("Unknown event '{other}'"))),
        }
    }

    async fn handle_create(
        &self,
        connection_id: ConnectionId,
        data: serde_json::Value,
    ) -> Result<(), ServerError> {
        let payload: CreateGame = parse(CREATE_GAME, data)?;
        let player = self.player(connection_id)?;

        let settings = GameSettings {
            team_count: payload.num_teams,
            team_names: payload.team_names,
            team_colors: payload.team_colors,
            difficulties: payload.difficulties,
            total_rounds: payload.total_rounds,
        };
        let entry = match self.registry.create(settings) {
            Ok(entry) => entry,
            Err(e) => {
                self.send_error(connection_id, &e.to_string());
                return Ok(());
            }
        };

        let (code, team_index, state) = {
            let mut session = entry.session.lock().await;
            let team_index = session.assign(player);
            (session.code().clone(), team_index, session.snapshot())
        };
        self.connections.join_room(&code, connection_id);
        self.send(
            connection_id,
            GAME_CREATED,
            &GameJoined {
                game_id: code.to_string(),
                team_index,
                state,
            },
        )?;
        info!("✅ Game created: {code}");
        Ok(())
    }

    async fn handle_join(
        &self,
        connection_id: ConnectionId,
        data: serde_json::Value,
    ) -> Result<(), ServerError> {
        let payload: GameRef = parse(JOIN_GAME, data)?;
        let entry = match self.registry.get(&payload.game_id) {
            Ok(entry) => entry,
            // The one place an unknown code is reported: the requester
            // gets an error, nobody else hears anything.
            Err(e) => {
                self.send_error(connection_id, &e.to_string());
                return Ok(());
            }
        };
        entry.touch();
        let player = self.player(connection_id)?;

        let code = GameCode::from(payload.game_id.as_str());
        self.connections.join_room(&code, connection_id);

        let (team_index, team_name, state, players) = {
            let mut session = entry.session.lock().await;
            let team_index = session.assign(player);
            (
                team_index,
                session.team_name(team_index).to_string(),
                session.snapshot(),
                session.roster(),
            )
        };

        self.send(
            connection_id,
            JOINED_GAME,
            &GameJoined {
                game_id: payload.game_id.clone(),
                team_index,
                state,
            },
        )?;
        self.broadcast(
            &code,
            PLAYER_JOINED,
            &PlayerJoined {
                team_index,
                team_name,
                players,
            },
        )?;
        info!("👥 Player joined {code} as team {team_index}");
        Ok(())
    }

    /// `start_game` and `restart_game` share everything but the reset.
    async fn handle_start(
        &self,
        _connection_id: ConnectionId,
        data: serde_json::Value,
        restart: bool,
    ) -> Result<(), ServerError> {
        let event = if restart { RESTART_GAME } else { START_GAME };
        let payload: GameRef = parse(event, data)?;
        let Ok(entry) = self.registry.get(&payload.game_id) else {
            return Ok(());
        };
        entry.touch();

        let state = {
            let mut session = entry.session.lock().await;
            if restart {
                session.restart();
            } else {
                session.start();
            }
            load_next_question(&mut session, self.provider.as_ref()).await;
            session.snapshot()
        };

        let code = GameCode::from(payload.game_id.as_str());
        self.broadcast(&code, GAME_STARTED, &state)?;
        if restart {
            info!("🔁 Game {code} restarted");
        } else {
            info!("🎮 Game {code} started");
        }
        Ok(())
    }

    async fn handle_reveal(
        &self,
        connection_id: ConnectionId,
        data: serde_json::Value,
    ) -> Result<(), ServerError> {
        let payload: RevealAnswer = parse(REVEAL_ANSWER, data)?;
        let Ok(entry) = self.registry.get(&payload.game_id) else {
            return Ok(());
        };
        entry.touch();
        let player = self.player(connection_id)?;

        // A negative index can never address an answer; treat it as the
        // same silent guard violation as an oversized one.
        let Ok(index) = usize::try_from(payload.answer_index) else {
            return Ok(());
        };

        let outcome = {
            let mut session = entry.session.lock().await;
            let team = session.team_of(player);
            session
                .reveal_answer(team, index)
                .map(|reveal| (reveal, session.snapshot()))
        };

        if let Some((reveal, state)) = outcome {
            let code = GameCode::from(payload.game_id.as_str());
            self.broadcast(
                &code,
                ANSWER_REVEALED,
                &AnswerRevealed {
                    answer_index: reveal.index,
                    points: reveal.points,
                    state,
                },
            )?;
        }
        Ok(())
    }

    async fn handle_advance(
        &self,
        connection_id: ConnectionId,
        data: serde_json::Value,
    ) -> Result<(), ServerError> {
        let payload: GameRef = parse(NEXT_QUESTION, data)?;
        let Ok(entry) = self.registry.get(&payload.game_id) else {
            return Ok(());
        };
        entry.touch();
        let player = self.player(connection_id)?;

        let outcome = {
            let mut session = entry.session.lock().await;
            let team = session.team_of(player);
            if !session.may_act(team) {
                None
            } else {
                load_next_question(&mut session, self.provider.as_ref()).await;
                Some((session.is_over(), session.snapshot()))
            }
        };

        let code = GameCode::from(payload.game_id.as_str());
        match outcome {
            Some((true, state)) => {
                self.broadcast(&code, GAME_OVER, &state)?;
                info!("🏁 Game {code} over");
            }
            Some((false, state)) => self.broadcast(&code, QUESTION_LOADED, &state)?,
            None => {}
        }
        Ok(())
    }

    fn player(&self, connection_id: ConnectionId) -> Result<PlayerId, ServerError> {
        self.connections
            .player_id(connection_id)
            .ok_or_else(|| ServerError::Internal(format!("Unknown connection {connection_id}")))
    }

    fn send(
        &self,
        connection_id: ConnectionId,
        event: &str,
        payload: &impl Serialize,
    ) -> Result<(), ServerError> {
        let message = encode(event, payload)?;
        self.connections.send_to_connection(connection_id, message);
        Ok(())
    }

    fn send_error(&self, connection_id: ConnectionId, message: &str) {
        self.connections
            .send_to_connection(connection_id, encode_error(message));
    }

    fn broadcast(
        &self,
        code: &GameCode,
        event: &str,
        payload: &impl Serialize,
    ) -> Result<(), ServerError> {
        let message = encode(event, payload)?;
        self.connections.broadcast_to_room(code, message);
        Ok(())
    }
}

fn parse<T: DeserializeOwned>(event: &str, data: serde_json::Value) -> Result<T, ServerError> {
    serde_json::from_value(data)
        .map_err(|e| ServerError::Network(format!("Invalid {event} payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_session::{Answer, MemoryQuestionProvider, Question};
    use std::net::SocketAddr;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    fn provider() -> MemoryQuestionProvider {
        let mut provider = MemoryQuestionProvider::new();
        provider.push(
            "easy",
            Question {
                text: "Name a color".to_string(),
                answers: vec![
                    Answer { text: "Red".to_string(), points: 40 },
                    Answer { text: "Blue".to_string(), points: 30 },
                ],
            },
        );
        provider
    }

    fn rig() -> (GameRouter, Arc<ConnectionManager>) {
        let connections = Arc::new(ConnectionManager::new());
        let router = GameRouter::new(
            Arc::new(SessionRegistry::new()),
            Arc::clone(&connections),
            Arc::new(provider()),
        );
        (router, connections)
    }

    fn connect(
        connections: &ConnectionManager,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (connection_id, _) =
            connections.add_connection(SocketAddr::from(([127, 0, 0, 1], 50000)), sender);
        (connection_id, receiver)
    }

    /// Pops the next frame off a connection's queue as (event, data).
    fn next_event(rx: &mut mpsc::UnboundedReceiver<Message>) -> (String, serde_json::Value) {
        let message = rx.try_recv().expect("a frame is queued");
        let envelope: Envelope =
            serde_json::from_str(message.to_text().expect("text frame")).expect("valid envelope");
        (envelope.event, envelope.data)
    }

    fn create_payload() -> String {
        serde_json::json!({
            "event": "create_game",
            "data": {
                "num_teams": 2,
                "team_names": ["Red", "Blue"],
                "difficulties": ["easy"],
                "total_rounds": 1,
            }
        })
        .to_string()
    }

    async fn create_game(
        router: &GameRouter,
        creator: ConnectionId,
        rx: &mut mpsc::UnboundedReceiver<Message>,
    ) -> String {
        router.route(creator, &create_payload()).await.expect("create routes");
        let (event, data) = next_event(rx);
        assert_eq!(event, "game_created");
        data["game_id"].as_str().expect("game id present").to_string()
    }

    fn room_event(game_id: &str, event: &str) -> String {
        serde_json::json!({ "event": event, "data": { "game_id": game_id } }).to_string()
    }

    #[tokio::test]
    async fn create_assigns_creator_to_team_zero() {
        let (router, connections) = rig();
        let (creator, mut rx) = connect(&connections);

        router.route(creator, &create_payload()).await.expect("create routes");
        let (event, data) = next_event(&mut rx);
        assert_eq!(event, "game_created");
        assert_eq!(data["team_index"], 0);
        assert_eq!(data["state"]["num_teams"], 2);
        assert_eq!(data["state"]["started"], false);
    }

    #[tokio::test]
    async fn invalid_team_count_yields_error_and_no_session() {
        let (router, connections) = rig();
        let (creator, mut rx) = connect(&connections);

        let bad = serde_json::json!({
            "event": "create_game",
            "data": {
                "num_teams": 0,
                "team_names": [],
                "difficulties": ["easy"],
            }
        })
        .to_string();
        router.route(creator, &bad).await.expect("domain errors are handled");
        let (event, data) = next_event(&mut rx);
        assert_eq!(event, "error");
        assert!(data["message"].as_str().expect("message").contains("team count"));
    }

    #[tokio::test]
    async fn join_unknown_code_errors_requester_only() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        let join = serde_json::json!({
            "event": "join_game",
            "data": { "game_id": "NOSUCH00" }
        })
        .to_string();
        router.route(joiner, &join).await.expect("handled");

        let (event, data) = next_event(&mut joiner_rx);
        assert_eq!(event, "error");
        assert_eq!(data["message"], "Game not found");
        // Nothing was broadcast to the existing room.
        assert!(creator_rx.try_recv().is_err());
        // And the real game is untouched.
        let _ = game_id;
    }

    #[tokio::test]
    async fn second_joiner_lands_on_team_one() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        router
            .route(joiner, &room_event(&game_id, "join_game"))
            .await
            .expect("join routes");

        let (event, data) = next_event(&mut joiner_rx);
        assert_eq!(event, "joined_game");
        assert_eq!(data["team_index"], 1);

        // The joiner also receives the room-wide roster update...
        let (event, data) = next_event(&mut joiner_rx);
        assert_eq!(event, "player_joined");
        assert_eq!(data["team_name"], "Blue");
        assert_eq!(data["players"]["0"], "Red");
        assert_eq!(data["players"]["1"], "Blue");

        // ...and so does the creator.
        let (event, _) = next_event(&mut creator_rx);
        assert_eq!(event, "player_joined");
    }

    #[tokio::test]
    async fn start_broadcasts_first_question_to_room() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        router
            .route(joiner, &room_event(&game_id, "join_game"))
            .await
            .expect("join routes");
        // Drain join traffic.
        while creator_rx.try_recv().is_ok() {}
        while joiner_rx.try_recv().is_ok() {}

        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");

        for rx in [&mut creator_rx, &mut joiner_rx] {
            let (event, data) = next_event(rx);
            assert_eq!(event, "game_started");
            assert_eq!(data["started"], true);
            assert_eq!(data["question_num"], 1);
            assert_eq!(data["current_team"], 0);
            assert_eq!(data["question_text"], "Name a color");
        }
    }

    #[tokio::test]
    async fn reveal_by_guessing_team_is_silent() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;
        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");
        while creator_rx.try_recv().is_ok() {}

        // Creator is team 0 and team 0 is guessing on turn 1.
        let reveal = serde_json::json!({
            "event": "reveal_answer",
            "data": { "game_id": game_id, "answer_index": 0 }
        })
        .to_string();
        router.route(creator, &reveal).await.expect("handled");
        assert!(creator_rx.try_recv().is_err(), "guard violations broadcast nothing");
    }

    #[tokio::test]
    async fn reveal_scores_once_and_rebroadcasts_state() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        router
            .route(joiner, &room_event(&game_id, "join_game"))
            .await
            .expect("join routes");
        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");
        while creator_rx.try_recv().is_ok() {}
        while joiner_rx.try_recv().is_ok() {}

        let reveal = serde_json::json!({
            "event": "reveal_answer",
            "data": { "game_id": game_id, "answer_index": 1 }
        })
        .to_string();
        router.route(joiner, &reveal).await.expect("reveal routes");

        let (event, data) = next_event(&mut creator_rx);
        assert_eq!(event, "answer_revealed");
        assert_eq!(data["answer_index"], 1);
        assert_eq!(data["points"], 30);
        assert_eq!(data["state"]["team_scores"][0], 30);

        // Second click on the same tile: nothing happens.
        router.route(joiner, &reveal).await.expect("handled");
        while joiner_rx.try_recv().is_ok() {}
        assert!(creator_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn negative_answer_index_is_a_silent_guard_violation() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        router
            .route(joiner, &room_event(&game_id, "join_game"))
            .await
            .expect("join routes");
        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");
        while creator_rx.try_recv().is_ok() {}
        while joiner_rx.try_recv().is_ok() {}

        let reveal = serde_json::json!({
            "event": "reveal_answer",
            "data": { "game_id": game_id, "answer_index": -1 }
        })
        .to_string();
        router.route(joiner, &reveal).await.expect("handled");
        assert!(creator_rx.try_recv().is_err());
        assert!(joiner_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn advance_walks_to_game_over() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        // 2 teams x 1 round = 2 turns.
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        router
            .route(joiner, &room_event(&game_id, "join_game"))
            .await
            .expect("join routes");
        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");
        while creator_rx.try_recv().is_ok() {}
        while joiner_rx.try_recv().is_ok() {}

        // Turn 1: team 0 guesses, so the joiner (team 1) advances.
        router
            .route(joiner, &room_event(&game_id, "next_question"))
            .await
            .expect("advance routes");
        let (event, data) = next_event(&mut creator_rx);
        assert_eq!(event, "question_loaded");
        assert_eq!(data["question_num"], 2);
        assert_eq!(data["current_team"], 1);
        while joiner_rx.try_recv().is_ok() {}

        // Turn 2: team 1 guesses, so the creator advances - past the end.
        router
            .route(creator, &room_event(&game_id, "next_question"))
            .await
            .expect("advance routes");
        let (event, data) = next_event(&mut creator_rx);
        assert_eq!(event, "game_over");
        assert_eq!(data["question_num"], 3);
    }

    #[tokio::test]
    async fn advance_by_guessing_team_is_silent() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;
        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");
        while creator_rx.try_recv().is_ok() {}

        router
            .route(creator, &room_event(&game_id, "next_question"))
            .await
            .expect("handled");
        assert!(creator_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn restart_zeroes_scores_and_counter() {
        let (router, connections) = rig();
        let (creator, mut creator_rx) = connect(&connections);
        let game_id = create_game(&router, creator, &mut creator_rx).await;

        let (joiner, mut joiner_rx) = connect(&connections);
        router
            .route(joiner, &room_event(&game_id, "join_game"))
            .await
            .expect("join routes");
        router
            .route(creator, &room_event(&game_id, "start_game"))
            .await
            .expect("start routes");
        let reveal = serde_json::json!({
            "event": "reveal_answer",
            "data": { "game_id": game_id, "answer_index": 0 }
        })
        .to_string();
        router.route(joiner, &reveal).await.expect("reveal routes");
        while creator_rx.try_recv().is_ok() {}
        while joiner_rx.try_recv().is_ok() {}

        router
            .route(creator, &room_event(&game_id, "restart_game"))
            .await
            .expect("restart routes");

        let (event, data) = next_event(&mut creator_rx);
        assert_eq!(event, "game_started");
        assert_eq!(data["team_scores"], serde_json::json!([0, 0, 0, 0]));
        assert_eq!(data["question_num"], 1, "restart loads the first question");
        assert_eq!(data["revealed"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unknown_event_and_bad_json_are_errors() {
        let (router, connections) = rig();
        let (connection, _rx) = connect(&connections);

        let result = router.route(connection, "{not json").await;
        assert!(matches!(result, Err(ServerError::Network(_))));

        let result = router
            .route(connection, r#"{"event":"dance","data":{}}"#)
            .await;
        assert!(matches!(result, Err(ServerError::Network(_))));
    }

    #[tokio::test]
    async fn in_game_events_with_unknown_code_are_silent() {
        let (router, connections) = rig();
        let (connection, mut rx) = connect(&connections);

        for event in ["start_game", "restart_game", "next_question"] {
            router
                .route(connection, &room_event("NOSUCH00", event))
                .await
                .expect("silently ignored");
        }
        let reveal = serde_json::json!({
            "event": "reveal_answer",
            "data": { "game_id": "NOSUCH00", "answer_index": 0 }
        })
        .to_string();
        router.route(connection, &reveal).await.expect("silently ignored");
        assert!(rx.try_recv().is_err());
    }
}
