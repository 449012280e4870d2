mod test_participant_leaves_others_stay;
mod test_three_participants_form_mesh;
