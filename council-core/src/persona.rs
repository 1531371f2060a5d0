// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Fixed persona catalogue
//!
//! Every node is bound to one of six personas. Each persona pins a backing
//! model on the Groq API plus a display name and description.

use serde::Serialize;

/// Persona whose model produces workspace summaries
pub const ORCHESTRATOR_PERSONA_ID: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub id: u8,
    pub model: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Ordered by id
pub const PERSONAS: [Persona; 6] = [
    Persona {
        id: 1,
        model: "meta-llama/llama-4-maverick-17b-128e-instruct",
        name: "Orchestrator (Chief of Staff)",
        description: "Synthesizes the five other perspectives, surfaces contradictions and reframes the decision",
    },
    Persona {
        id: 2,
        model: "moonshotai/kimi-k2-instruct",
        name: "Market Compass",
        description: "Reads market signals, trends and the competitive landscape",
    },
    Persona {
        id: 3,
        model: "openai/gpt-oss-20b",
        name: "Financial Guardian",
        description: "Simulates cash flow, stress-tests the financials and checks the arithmetic",
    },
    Persona {
        id: 4,
        model: "meta-llama/llama-4-scout-17b-16e-instruct",
        name: "Strategy Analyst",
        description: "Applies strategic frameworks, finds blind spots and tests assumptions",
    },
    Persona {
        id: 5,
        model: "llama-3.3-70b-versatile",
        name: "People Advisor",
        description: "Considers organizational psychology, human reactions and the right tone",
    },
    Persona {
        id: 6,
        model: "llama-3.1-8b-instant",
        name: "Action Architect",
        description: "Plans execution, timelines and resources with realistic risk",
    },
];

impl Persona {
    pub fn lookup(id: u8) -> Option<&'static Persona> {
        PERSONAS.iter().find(|p| p.id == id)
    }

    pub fn orchestrator() -> &'static Persona {
        &PERSONAS[(ORCHESTRATOR_PERSONA_ID - 1) as usize]
    }

    pub fn all() -> &'static [Persona] {
        &PERSONAS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_accepts_only_known_ids() {
        for id in 1..=6 {
            assert_eq!(Persona::lookup(id).map(|p| p.id), Some(id));
        }
        assert!(Persona::lookup(0).is_none());
        assert!(Persona::lookup(7).is_none());
    }

    #[test]
    fn test_orchestrator_is_persona_one() {
        let orchestrator = Persona::orchestrator();
        assert_eq!(orchestrator.id, ORCHESTRATOR_PERSONA_ID);
        assert_eq!(
            orchestrator.model,
            "meta-llama/llama-4-maverick-17b-128e-instruct"
        );
    }
}
