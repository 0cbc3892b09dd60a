//! Ghost program instruction builders
//!
//! None of the Ghost instructions take arguments; the program derives
//! amounts from the wallet's summary and its own tier table.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use super::program::{GhostProgram, DISCRIMINATORS};

/// Build the `ghostx_mint` instruction
pub fn mint(program: &GhostProgram, user: &Pubkey) -> Instruction {
    // Order matters! Must match the program's Accounts struct
    let accounts = vec![
        AccountMeta::new(*user, true),                              // user (signer)
        AccountMeta::new(program.user_summary(user), false),        // user_summary
        AccountMeta::new(program.system_state(), false),            // system_state
        AccountMeta::new(program.mint, false),                      // ghost_mint
        AccountMeta::new_readonly(program.mint_authority(), false), // mint_authority
        AccountMeta::new(program.holding_account(user), false),     // user_token_account
        AccountMeta::new_readonly(spl_token::ID, false),            // token_program
        AccountMeta::new_readonly(spl_associated_token_account::ID, false), // associated_token_program
        AccountMeta::new_readonly(solana_sdk::system_program::ID, false),   // system_program
    ];

    Instruction {
        program_id: program.program_id,
        accounts,
        data: DISCRIMINATORS::MINT.to_vec(),
    }
}

/// Build the `ghostx_upgrade` instruction (stakes the next tier's threshold)
pub fn upgrade(program: &GhostProgram, user: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*user, true),                          // user (signer)
        AccountMeta::new(program.user_summary(user), false),    // user_summary
        AccountMeta::new(program.system_state(), false),        // system_state
        AccountMeta::new_readonly(program.mint, false),         // ghost_mint
        AccountMeta::new(program.holding_account(user), false), // user_token_account
        AccountMeta::new(program.stake_vault(), false),         // stake_vault
        AccountMeta::new_readonly(spl_token::ID, false),        // token_program
        AccountMeta::new_readonly(solana_sdk::system_program::ID, false), // system_program
    ];

    Instruction {
        program_id: program.program_id,
        accounts,
        data: DISCRIMINATORS::UPGRADE.to_vec(),
    }
}

/// Build the `ghostx_claim` instruction
///
/// Also used read-only: simulating it makes the program emit a
/// `GhostClaimEvent` with the currently accrued reward.
pub fn claim(program: &GhostProgram, user: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*user, true),                              // user (signer)
        AccountMeta::new(program.user_summary(user), false),        // user_summary
        AccountMeta::new(program.system_state(), false),            // system_state
        AccountMeta::new(program.mint, false),                      // ghost_mint
        AccountMeta::new_readonly(program.mint_authority(), false), // mint_authority
        AccountMeta::new(program.holding_account(user), false),     // user_token_account
        AccountMeta::new_readonly(spl_token::ID, false),            // token_program
        AccountMeta::new_readonly(solana_sdk::system_program::ID, false), // system_program
    ];

    Instruction {
        program_id: program.program_id,
        accounts,
        data: DISCRIMINATORS::CLAIM.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_instruction_layout() {
        let program = GhostProgram::default();
        let user = Pubkey::new_unique();
        let ix = mint(&program, &user);

        assert_eq!(ix.program_id, program.program_id);
        assert_eq!(ix.data, DISCRIMINATORS::MINT.to_vec());
        assert_eq!(ix.accounts.len(), 9);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[0].pubkey, user);
        assert_eq!(ix.accounts[5].pubkey, program.holding_account(&user));
    }

    #[test]
    fn test_only_user_signs() {
        let program = GhostProgram::default();
        let user = Pubkey::new_unique();

        for ix in [
            mint(&program, &user),
            upgrade(&program, &user),
            claim(&program, &user),
        ] {
            let signers: Vec<_> = ix.accounts.iter().filter(|a| a.is_signer).collect();
            assert_eq!(signers.len(), 1);
            assert_eq!(signers[0].pubkey, user);
        }
    }

    #[test]
    fn test_upgrade_uses_stake_vault() {
        let program = GhostProgram::default();
        let user = Pubkey::new_unique();
        let ix = upgrade(&program, &user);

        assert_eq!(ix.data, DISCRIMINATORS::UPGRADE.to_vec());
        assert!(ix
            .accounts
            .iter()
            .any(|a| a.pubkey == program.stake_vault() && a.is_writable));
    }
}
